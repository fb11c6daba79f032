//! Error types for the observer API layer.
//!
//! [`ObserverError`] unifies the handler failure modes into a single enum
//! that converts into an Axum HTTP response. Store outages map to `503`
//! so clients know a retry is reasonable -- a query failure must never
//! look like a missing resource, and it never touches the subscription
//! pipeline.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sensorhub_ingest::StoreError;

/// Errors that can occur in the observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The reading store could not be queried. Retryable.
    #[error("storage unavailable: {0}")]
    Store(String),

    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl From<StoreError> for ObserverError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => Self::Store(msg),
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Store(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            Self::InvalidQuery(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
