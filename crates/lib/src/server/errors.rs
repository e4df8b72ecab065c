//! Error-to-status mapping for the HTTP boundary.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Wrapper turning engine errors into HTTP responses.
///
/// The mapping follows the library's error classification: not-found 404,
/// malformed request 400, transient storage 503 (safe to retry), anything
/// else 500. Bodies are `{"error": ...}` objects.
pub struct ApiError(crate::Error);

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;

        if err.is_not_found() {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Key not found"})),
            )
                .into_response();
        }

        let status = if err.is_validation_error() {
            StatusCode::BAD_REQUEST
        } else if err.is_transient() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            tracing::error!(module = err.module(), "request failed: {err}");
        }

        (status, Json(json!({"error": err.to_string()}))).into_response()
    }
}
