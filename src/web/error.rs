use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// The route-level error taxonomy. Handlers catch all downstream errors
/// and convert them to one of these; nothing is retried server-side.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 503: a required external integration is not configured.
    #[error("{0} not configured")]
    NotConfigured(&'static str),
    /// 400: schema/validation failure.
    #[error("{0}")]
    BadRequest(String),
    /// 403: the caller is authenticated but not allowed to proceed.
    #[error("{0}")]
    Forbidden(String),
    /// 404: missing row, foreign row, or failed precondition.
    #[error("{0}")]
    NotFound(&'static str),
    /// 500: internal or provider failure; the client gets an opaque
    /// message, the log gets the details.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotConfigured(what) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("{what} not configured"),
            ),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message.to_string()),
            Self::Internal(e) => {
                error!("Internal error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(e.into())
    }
}
