use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use models::errors::ModelError;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

use crate::metrics;

/// HTTP error with a `{"error": "..."}` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub message: String,
}

impl JsonApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not found")
    }

    pub fn invalid_uuid() -> Self {
        Self::bad_request("invalid uuid")
    }

    /// Map a service failure. `persist_msg` is what the client sees when the
    /// ledger could not be written; the underlying cause only goes to the log.
    pub fn from_service(e: ServiceError, persist_msg: &str) -> Self {
        match e {
            ServiceError::Model(ModelError::Validation(msg)) => Self::bad_request(msg),
            ServiceError::NotFound(_) => Self::not_found(),
            ServiceError::Storage(cause) => {
                metrics::PERSIST_FAILURES_TOTAL.inc();
                error!(error = %cause, "failed to persist ledger");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, persist_msg)
            }
        }
    }
}

impl From<JsonRejection> for JsonApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for JsonApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("storage init failed: {0}")]
    Storage(#[from] ServiceError),
    #[error("runtime check failed: {0}")]
    Runtime(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_status_and_message() {
        let e = JsonApiError::from_service(
            ServiceError::Model(ModelError::Validation("user cannot be empty".into())),
            "x",
        );
        assert_eq!(e, JsonApiError::bad_request("user cannot be empty"));

        let e = JsonApiError::from_service(ServiceError::not_found("transaction"), "x");
        assert_eq!(e.status, StatusCode::NOT_FOUND);
        assert_eq!(e.message, "not found");

        let e = JsonApiError::from_service(ServiceError::Storage("disk full".into()), "failed to save changes");
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.message, "failed to save changes");
    }
}
