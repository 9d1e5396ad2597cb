//! Router configuration for the HTTP API.
//!
//! Sets up all routes, middleware (CORS, compression, tracing, body limit)
//! and the static file service, producing an axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, MethodRouter},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Request bodies are small JSON:API documents.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Register `path` both with and without its trailing slash.
fn both_slashes(router: Router<AppState>, path: &str, route: MethodRouter<AppState>) -> Router<AppState> {
    let bare = path.trim_end_matches('/');
    router
        .route(&format!("{}/", bare), route.clone())
        .route(bare, route)
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut api = Router::new();
    api = both_slashes(
        api,
        "/api/schema/",
        get(handlers::get_schema),
    );
    api = both_slashes(api, "/api/schema/swagger-ui/", get(handlers::swagger_ui));
    api = both_slashes(api, "/api/schema/redoc/", get(handlers::redoc));
    api = both_slashes(
        api,
        "/api/wallets/",
        get(handlers::list_wallets).post(handlers::create_wallet),
    );
    api = both_slashes(
        api,
        "/api/wallets/{id}/",
        get(handlers::get_wallet)
            .patch(handlers::update_wallet)
            .delete(handlers::delete_wallet),
    );
    api = both_slashes(
        api,
        "/api/transactions/",
        get(handlers::list_transactions).post(handlers::create_transaction),
    );
    // Transactions are immutable: no PUT/PATCH.
    api = both_slashes(
        api,
        "/api/transactions/{id}/",
        get(handlers::get_transaction).delete(handlers::delete_transaction),
    );

    let static_files = ServeDir::new(&state.static_root);

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(api)
        .nest_service("/static", static_files)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn crate::db::repository::FullRepository>;
        let state = AppState::new(repo);
        let _router = create_router(state);
    }
}
