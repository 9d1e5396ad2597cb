#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use b2b_wallet::db::repositories::LocalRepository;
use b2b_wallet::db::FullRepository;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Variables are restored on unwind, and access is serialized because the
/// process environment is shared by tests running in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Every database-related variable the factory and config read, cleared.
pub const NO_DATABASE_ENV: &[(&str, Option<&str>)] = &[
    ("REPOSITORY_TYPE", None),
    ("DATABASE_URL", None),
    ("PG_DATABASE_URL", None),
    ("POSTGRES_DB", None),
    ("POSTGRES_USER", None),
    ("POSTGRES_PASSWORD", None),
    ("DB_HOST", None),
    ("DB_PORT", None),
];

pub fn local_repo() -> (Arc<LocalRepository>, Arc<dyn FullRepository>) {
    let repo = Arc::new(LocalRepository::new());
    let dyn_repo: Arc<dyn FullRepository> = repo.clone();
    (repo, dyn_repo)
}

#[cfg(feature = "http-server")]
pub mod http {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use b2b_wallet::http::{create_router, AppState};

    pub const MEDIA_TYPE: &str = "application/vnd.api+json";

    /// A router over a fresh in-memory repository.
    pub fn app() -> Router {
        let (_, repo) = super::local_repo();
        create_router(AppState::new(repo))
    }

    pub struct TestResponse {
        pub status: StatusCode,
        pub content_type: Option<String>,
        pub body: Value,
    }

    impl TestResponse {
        /// The first entry of an error document.
        pub fn error(&self) -> &Value {
            &self.body["errors"][0]
        }
    }

    pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        // Non-JSON bodies (HTML pages) come back as a string.
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            content_type,
            body,
        }
    }

    pub async fn get(app: &Router, uri: &str) -> TestResponse {
        send(app, Method::GET, uri, None).await
    }

    pub async fn post(app: &Router, uri: &str, body: Value) -> TestResponse {
        send(app, Method::POST, uri, Some(body)).await
    }

    pub async fn create_wallet(app: &Router, label: &str) -> String {
        let res = post(
            app,
            "/api/wallets/",
            serde_json::json!({"data": {"type": "Wallet", "attributes": {"label": label}}}),
        )
        .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
        res.body["data"]["id"].as_str().unwrap().to_string()
    }

    pub fn transaction_body(wallet_id: &str, txid: &str, amount: &str) -> Value {
        serde_json::json!({
            "data": {
                "type": "Transaction",
                "attributes": {"txid": txid, "amount": amount},
                "relationships": {"wallet": {"data": {"type": "Wallet", "id": wallet_id}}}
            }
        })
    }

    pub async fn create_transaction(app: &Router, wallet_id: &str, txid: &str, amount: &str) -> TestResponse {
        post(app, "/api/transactions/", transaction_body(wallet_id, txid, amount)).await
    }
}
