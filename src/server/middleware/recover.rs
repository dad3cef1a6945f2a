//! Converts a caught panic into a `500` JSON error rather than letting the
//! connection drop.

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Passed to [`tower_http::catch_panic::CatchPanicLayer::custom`].
pub fn panic_response(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };

    error!(panic = %message, "recovered from panic in handler");

    let body = serde_json::json!({
        "type": "error",
        "error": { "type": "api_error", "message": "Internal server error" },
    });
    let bytes = Bytes::from(serde_json::to_vec(&body).unwrap_or_default());
    (StatusCode::INTERNAL_SERVER_ERROR, [("content-type", "application/json")], bytes).into_response()
}
