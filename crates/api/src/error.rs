//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::InvalidDocumentId;
use document_store::DocumentStoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// The write collides with an existing document.
    ///
    /// Rendered as 400 rather than 409; existing clients check for 400.
    Conflict(String),
    /// Document store error.
    Store(DocumentStoreError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) | ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Store(err) => store_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn store_error_to_response(err: DocumentStoreError) -> (StatusCode, String) {
    match &err {
        DocumentStoreError::DuplicateKey { .. }
        | DocumentStoreError::InvalidUpdate { .. }
        | DocumentStoreError::Serialization(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        DocumentStoreError::Database(_) => {
            tracing::error!(error = %err, "document store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<DocumentStoreError> for ApiError {
    fn from(err: DocumentStoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<InvalidDocumentId> for ApiError {
    fn from(err: InvalidDocumentId) -> Self {
        ApiError::BadRequest(format!("Invalid ID format: {err}"))
    }
}
