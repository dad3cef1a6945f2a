pub mod health;
pub mod images;
pub mod messages;
pub mod models;
pub mod refresh;

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::account::AccountManager;
use crate::error::{ErrorKind, GatewayError, classify_gateway_error};

/// Builds the Anthropic error body for a non-provider failure this handler
/// layer detects directly (body-too-large, not-found, …).
pub fn error_body(kind: ErrorKind, message: impl Into<String>) -> serde_json::Value {
    serde_json::json!({
        "type": "error",
        "error": { "type": kind.wire_type(), "message": message.into() },
    })
}

pub fn error_response(status: StatusCode, kind: ErrorKind, message: impl Into<String>) -> Response {
    (status, axum::Json(error_body(kind, message))).into_response()
}

pub fn gateway_error_response(err: &GatewayError) -> Response {
    let classified = classify_gateway_error(err);
    let status = StatusCode::from_u16(classified.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, axum::Json(classified.body())).into_response()
}

/// Renders a provider-originated failure, applying §4.4's authentication
/// side effect: an `authentication_error` clears both account caches and
/// has its message rewritten to say so.
pub fn shape_provider_error(accounts: &AccountManager, err: &GatewayError) -> Response {
    let mut classified = classify_gateway_error(err);
    if classified.kind == ErrorKind::Authentication {
        accounts.clear_token_cache("");
        accounts.clear_project_cache("");
        classified.message = format!("{} (caches cleared)", classified.message);
    }
    let status = StatusCode::from_u16(classified.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, axum::Json(classified.body())).into_response()
}

/// Catch-all for any path not matched by a route.
pub async fn not_found(method: axum::http::Method, uri: Uri) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        ErrorKind::NotFound,
        format!("no route for {method} {uri}"),
    )
}
