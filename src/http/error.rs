//! HTTP error handling and JSON:API error documents.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::dto::JsonApi;
use crate::db::repository::RepositoryError;
use crate::models::validation::{FieldError, NON_FIELD_ERRORS};
use crate::query::QueryError;

/// Where in the request an error originated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

/// One entry of a JSON:API `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub status: String,
    /// Error code for programmatic handling
    pub code: String,
    pub title: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

/// `{"errors": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDocument {
    pub errors: Vec<ApiError>,
}

/// JSON pointer for an input field: relationships live under
/// `/data/relationships`, request-wide errors point at `/data`.
pub fn field_pointer(field: &str) -> String {
    match field {
        NON_FIELD_ERRORS => "/data".to_string(),
        "wallet" => "/data/relationships/wallet".to_string(),
        other => format!("/data/attributes/{}", other),
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Malformed request document
    BadRequest(String),
    /// Resource type or id in the document does not match the endpoint
    Conflict(String),
    /// Invalid field in the request document
    Field(FieldError),
    /// Invalid list query parameter
    Query(QueryError),
    /// Repository error
    Repository(RepositoryError),
}

impl AppError {
    fn parts(self) -> (StatusCode, &'static str, String, Option<ErrorSource>) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "parse_error",
                msg,
                Some(ErrorSource {
                    pointer: Some("/data".to_string()),
                    parameter: None,
                }),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            AppError::Field(err) => (
                StatusCode::BAD_REQUEST,
                "invalid",
                err.message,
                Some(ErrorSource {
                    pointer: Some(field_pointer(&err.field)),
                    parameter: None,
                }),
            ),
            AppError::Query(QueryError::InvalidPage) => (
                StatusCode::NOT_FOUND,
                "not_found",
                QueryError::InvalidPage.to_string(),
                None,
            ),
            AppError::Query(err) => {
                let parameter = err.parameter();
                (
                    StatusCode::BAD_REQUEST,
                    "invalid",
                    err.to_string(),
                    Some(ErrorSource {
                        pointer: None,
                        parameter: Some(parameter),
                    }),
                )
            }
            AppError::Repository(err) => repository_parts(err),
        }
    }
}

fn repository_parts(err: RepositoryError) -> (StatusCode, &'static str, String, Option<ErrorSource>) {
    match &err {
        RepositoryError::ValidationError { message, context } => (
            StatusCode::BAD_REQUEST,
            "invalid",
            message.clone(),
            Some(ErrorSource {
                pointer: Some(field_pointer(
                    context.field.as_deref().unwrap_or(NON_FIELD_ERRORS),
                )),
                parameter: None,
            }),
        ),
        RepositoryError::NotFound { message, .. } => {
            (StatusCode::NOT_FOUND, "not_found", message.clone(), None)
        }
        RepositoryError::ConnectionError { .. } | RepositoryError::TimeoutError { .. } => {
            tracing::error!(error = %err, "Storage unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                err.message().to_string(),
                None,
            )
        }
        _ => {
            tracing::error!(error = %err, "Repository failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "error",
                "A server error occurred.".to_string(),
                None,
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, detail, source) = self.parts();
        let error = ApiError {
            status: status.as_u16().to_string(),
            code: code.to_string(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            detail,
            source,
        };

        (status, JsonApi(ErrorDocument { errors: vec![error] })).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<FieldError> for AppError {
    fn from(err: FieldError) -> Self {
        AppError::Field(err)
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        AppError::Query(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_pointers() {
        assert_eq!(field_pointer("amount"), "/data/attributes/amount");
        assert_eq!(field_pointer("wallet"), "/data/relationships/wallet");
        assert_eq!(field_pointer(NON_FIELD_ERRORS), "/data");
    }

    #[test]
    fn test_status_mapping() {
        let status = |e: AppError| e.into_response().status();
        assert_eq!(
            status(RepositoryError::validation("bad").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(RepositoryError::not_found("gone").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(RepositoryError::connection("down").into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(RepositoryError::internal("boom").into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status(QueryError::InvalidPage.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status(QueryError::UnknownParameter("x".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AppError::Conflict("type".into())),
            StatusCode::CONFLICT
        );
    }
}
