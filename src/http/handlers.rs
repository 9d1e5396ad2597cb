//! HTTP handlers for the REST API.
//!
//! Each handler unpacks the JSON:API document, checks it against the endpoint
//! and delegates to the service layer.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde_json::Value;

use super::dto::{
    scalar_to_string, Document, HealthResponse, JsonApi, ListDocument, RequestData,
    RequestDocument, TransactionInput, TransactionResource, WalletInput, WalletResource,
    TRANSACTION_TYPE, WALLET_TYPE,
};
use super::error::AppError;
use super::schema::openapi_document;
use super::state::AppState;
use crate::db::services as db_services;
use crate::models::validation::FieldError;
use crate::models::{TransactionId, WalletId};
use crate::query::{ListParams, PageRequest, TransactionQuery, WalletQuery};

/// Result type for handlers.
pub type HandlerResult<T> = Result<JsonApi<T>, AppError>;

type Created<T> = Result<(StatusCode, JsonApi<T>), AppError>;

// =============================================================================
// Request helpers
// =============================================================================

/// Path ids that are not integers cannot match any row.
fn parse_id(raw: &str, resource: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::NotFound(format!("No {} matches the given query.", resource)))
}

fn body<A>(
    payload: Result<Json<RequestDocument<A>>, JsonRejection>,
) -> Result<RequestData<A>, AppError> {
    payload
        .map(|Json(doc)| doc.data)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn expect_type<A>(data: &RequestData<A>, expected: &str) -> Result<(), AppError> {
    if data.type_ != expected {
        return Err(AppError::Conflict(format!(
            "The resource object's type ({}) is not the type that constitute the collection represented by the endpoint ({}).",
            data.type_, expected
        )));
    }
    Ok(())
}

fn expect_id<A>(data: &RequestData<A>, path_id: i64) -> Result<(), AppError> {
    let id = data.id.as_ref().ok_or_else(|| {
        AppError::BadRequest("The resource object must contain an 'id' member.".to_string())
    })?;
    let id = scalar_to_string(id).unwrap_or_else(|| id.to_string());
    if id != path_id.to_string() {
        return Err(AppError::Conflict(format!(
            "The resource object's id ({}) does not match the id in the URL ({}).",
            id, path_id
        )));
    }
    Ok(())
}

fn list_params(pairs: Vec<(String, String)>) -> Result<ListParams, AppError> {
    Ok(ListParams::parse(pairs)?)
}

/// The wallet referenced by a transaction's `relationships.wallet`.
fn wallet_reference(data: &RequestData<TransactionInput>) -> Result<Option<WalletId>, AppError> {
    let Some(identifier) = data
        .relationships
        .as_ref()
        .and_then(|r| r.wallet.as_ref())
        .and_then(|w| w.data.as_ref())
    else {
        return Ok(None);
    };

    if identifier.type_ != WALLET_TYPE {
        return Err(AppError::Conflict(format!(
            "Incorrect relation type. Expected {}, received {}.",
            WALLET_TYPE, identifier.type_
        )));
    }

    scalar_to_string(&identifier.id)
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .map(|id| Some(WalletId::new(id)))
        .ok_or_else(|| {
            FieldError::new("wallet", "Incorrect type. Expected pk value, received str.").into()
        })
}

fn amount_text(value: Option<&Value>) -> Result<Option<String>, AppError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => scalar_to_string(v)
            .map(Some)
            .ok_or_else(|| FieldError::new("amount", "A valid number is required.").into()),
    }
}

// =============================================================================
// Health Check & Schema
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
    })
}

/// GET /api/schema/
pub async fn get_schema() -> Json<Value> {
    Json(openapi_document())
}

/// GET /api/schema/swagger-ui/
pub async fn swagger_ui() -> Html<&'static str> {
    Html(include_str!("docs/swagger-ui.html"))
}

/// GET /api/schema/redoc/
pub async fn redoc() -> Html<&'static str> {
    Html(include_str!("docs/redoc.html"))
}

// =============================================================================
// Wallets
// =============================================================================

/// GET /api/wallets/
pub async fn list_wallets(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> HandlerResult<ListDocument<WalletResource>> {
    let params = list_params(pairs)?;
    let query = WalletQuery::from_params(&params)?;
    let page = PageRequest::from_params(&params, state.page_size)?;

    let wallets = db_services::list_wallets(state.repository.as_ref(), &query, page).await?;
    Ok(JsonApi(ListDocument::from_page(wallets, "/api/wallets/", &params)))
}

/// POST /api/wallets/
pub async fn create_wallet(
    State(state): State<AppState>,
    payload: Result<Json<RequestDocument<WalletInput>>, JsonRejection>,
) -> Created<Document<WalletResource>> {
    let data = body(payload)?;
    expect_type(&data, WALLET_TYPE)?;

    let label = data.attributes.and_then(|a| a.label);
    let wallet = db_services::create_wallet(state.repository.as_ref(), label.as_deref()).await?;
    Ok((
        StatusCode::CREATED,
        JsonApi(Document {
            data: wallet.into(),
        }),
    ))
}

/// GET /api/wallets/{id}/
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<Document<WalletResource>> {
    let id = WalletId::new(parse_id(&id, WALLET_TYPE)?);
    let wallet = db_services::get_wallet(state.repository.as_ref(), id).await?;
    Ok(JsonApi(Document {
        data: wallet.into(),
    }))
}

/// PATCH /api/wallets/{id}/
///
/// Only the label can change; `balance` in the document is ignored.
pub async fn update_wallet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RequestDocument<WalletInput>>, JsonRejection>,
) -> HandlerResult<Document<WalletResource>> {
    let id = parse_id(&id, WALLET_TYPE)?;
    let data = body(payload)?;
    expect_type(&data, WALLET_TYPE)?;
    expect_id(&data, id)?;

    let label = data.attributes.and_then(|a| a.label);
    let wallet =
        db_services::rename_wallet(state.repository.as_ref(), WalletId::new(id), label.as_deref())
            .await?;
    Ok(JsonApi(Document {
        data: wallet.into(),
    }))
}

/// DELETE /api/wallets/{id}/
pub async fn delete_wallet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = WalletId::new(parse_id(&id, WALLET_TYPE)?);
    db_services::delete_wallet(state.repository.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Transactions
// =============================================================================

/// GET /api/transactions/
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> HandlerResult<ListDocument<TransactionResource>> {
    let params = list_params(pairs)?;
    let query = TransactionQuery::from_params(&params)?;
    let page = PageRequest::from_params(&params, state.page_size)?;

    let transactions =
        db_services::list_transactions(state.repository.as_ref(), &query, page).await?;
    Ok(JsonApi(ListDocument::from_page(
        transactions,
        "/api/transactions/",
        &params,
    )))
}

/// POST /api/transactions/
pub async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<RequestDocument<TransactionInput>>, JsonRejection>,
) -> Created<Document<TransactionResource>> {
    let data = body(payload)?;
    expect_type(&data, TRANSACTION_TYPE)?;

    let wallet_id = wallet_reference(&data)?;
    let attributes = data.attributes.unwrap_or_default();
    let amount = amount_text(attributes.amount.as_ref())?;

    let tx = db_services::create_transaction(
        state.repository.as_ref(),
        wallet_id,
        attributes.txid.as_deref(),
        amount.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, JsonApi(Document { data: tx.into() })))
}

/// GET /api/transactions/{id}/
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<Document<TransactionResource>> {
    let id = TransactionId::new(parse_id(&id, TRANSACTION_TYPE)?);
    let tx = db_services::get_transaction(state.repository.as_ref(), id).await?;
    Ok(JsonApi(Document { data: tx.into() }))
}

/// DELETE /api/transactions/{id}/
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = TransactionId::new(parse_id(&id, TRANSACTION_TYPE)?);
    db_services::delete_transaction(state.repository.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
