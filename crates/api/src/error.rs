//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ordering::OrderError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
///
/// Coordinator failures, including insufficient stock, are collapsed to
/// a generic server error on the wire; the classified cause is logged.
/// Only precondition violations (400) and missing rows (404) are
/// distinguished for the client.
#[derive(Debug)]
pub enum ApiError {
    /// Order placement error.
    Order(OrderError),
    /// Store error from a pass-through endpoint.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Order(OrderError::Validation(msg)) => {
                error_body(StatusCode::BAD_REQUEST, &msg)
            }
            ApiError::Order(err) => {
                tracing::error!(error = %err, "order placement failed");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
            ApiError::Store(StoreError::NotFound { entity, .. }) => message_body(
                StatusCode::NOT_FOUND,
                &format!("{} not found", capitalize(entity)),
            ),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "store operation failed");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "error": message });
    (status, axum::Json(body)).into_response()
}

fn message_body(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "message": message });
    (status, axum::Json(body)).into_response()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
