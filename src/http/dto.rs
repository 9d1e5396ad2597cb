//! JSON:API documents exchanged by the HTTP API.

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::form_urlencoded;

use crate::models::decimal::format_decimal;
use crate::models::{Transaction, Wallet};
use crate::query::{ListParams, Page};

/// Media type of every request and response document.
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

pub const WALLET_TYPE: &str = "Wallet";
pub const TRANSACTION_TYPE: &str = "Transaction";

/// JSON body served as `application/vnd.api+json`.
#[derive(Debug, Clone)]
pub struct JsonApi<T>(pub T);

impl<T: Serialize> IntoResponse for JsonApi<T> {
    fn into_response(self) -> Response {
        let mut response = axum::Json(self.0).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSON_API_MEDIA_TYPE),
        );
        response
    }
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfLink {
    #[serde(rename = "self")]
    pub self_: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletAttributes {
    pub label: String,
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletResource {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
    pub attributes: WalletAttributes,
    pub links: SelfLink,
}

impl From<Wallet> for WalletResource {
    fn from(wallet: Wallet) -> Self {
        Self {
            type_: WALLET_TYPE.to_string(),
            id: wallet.id.to_string(),
            links: SelfLink {
                self_: format!("/api/wallets/{}/", wallet.id),
            },
            attributes: WalletAttributes {
                label: wallet.label,
                balance: format_decimal(&wallet.balance),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionAttributes {
    pub txid: String,
    pub amount: String,
    /// RFC 3339
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletRelationship {
    pub data: ResourceIdentifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRelationships {
    pub wallet: WalletRelationship,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResource {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
    pub attributes: TransactionAttributes,
    pub relationships: TransactionRelationships,
    pub links: SelfLink,
}

impl From<Transaction> for TransactionResource {
    fn from(tx: Transaction) -> Self {
        Self {
            type_: TRANSACTION_TYPE.to_string(),
            id: tx.id.to_string(),
            links: SelfLink {
                self_: format!("/api/transactions/{}/", tx.id),
            },
            attributes: TransactionAttributes {
                txid: tx.txid,
                amount: format_decimal(&tx.amount),
                timestamp: tx
                    .timestamp
                    .to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            },
            relationships: TransactionRelationships {
                wallet: WalletRelationship {
                    data: ResourceIdentifier {
                        type_: WALLET_TYPE.to_string(),
                        id: tx.wallet_id.to_string(),
                    },
                },
            },
        }
    }
}

/// Top-level document carrying a single resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document<T> {
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationLinks {
    pub first: String,
    pub last: String,
    pub next: Option<String>,
    pub prev: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub pages: u64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListMeta {
    pub pagination: Pagination,
}

/// Top-level document carrying one page of resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListDocument<T> {
    pub links: PaginationLinks,
    pub data: Vec<T>,
    pub meta: ListMeta,
}

fn page_link(path: &str, params: &ListParams, number: u64) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params.base_pairs() {
        query.append_pair(&key, &value);
    }
    query.append_pair("page[number]", &number.to_string());
    format!("{}?{}", path, query.finish())
}

impl<T> ListDocument<T> {
    /// Build a list document whose links keep the request's filters, sort and size.
    pub fn from_page<E: Into<T>>(page: Page<E>, path: &str, params: &ListParams) -> Self {
        let pages = page.pages();
        let links = PaginationLinks {
            first: page_link(path, params, 1),
            last: page_link(path, params, pages),
            next: page.next_number().map(|n| page_link(path, params, n)),
            prev: page.prev_number().map(|n| page_link(path, params, n)),
        };
        let meta = ListMeta {
            pagination: Pagination {
                page: page.request.number,
                pages,
                count: page.total,
            },
        };

        Self {
            links,
            data: page.items.into_iter().map(Into::into).collect(),
            meta,
        }
    }
}

/// Response for `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

// =============================================================================
// Requests
// =============================================================================

/// Incoming `{"data": {...}}` document.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestDocument<A> {
    pub data: RequestData<A>,
}

/// Incoming resource object. `id` may be sent as a string or a number.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestData<A> {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub attributes: Option<A>,
    #[serde(default)]
    pub relationships: Option<RequestRelationships>,
}

/// Writable wallet attributes; `balance` is read-only and ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletInput {
    #[serde(default)]
    pub label: Option<String>,
}

/// Writable transaction attributes; `timestamp` is read-only and ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionInput {
    #[serde(default)]
    pub txid: Option<String>,
    /// Decimal string, or a JSON number (subject to float rounding)
    #[serde(default)]
    pub amount: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestRelationships {
    #[serde(default)]
    pub wallet: Option<RelationshipInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationshipInput {
    pub data: Option<IdentifierInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentifierInput {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: Value,
}

/// Render a JSON scalar the way it would appear in a URL or form field.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
