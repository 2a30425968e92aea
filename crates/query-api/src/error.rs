//! Error types for the query API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors returned before a query is run.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A query parameter failed validation. Carries the caller-facing text.
    #[error("{0}")]
    InvalidParam(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidParam(msg) => {
                tracing::debug!("Rejected request: {}", msg);
                StatusCode::BAD_REQUEST
            }
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
