//! Bearer / `x-api-key` authentication.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::error::{ErrorKind, GatewayError};
use crate::server::state::AppState;

fn error_response(status: StatusCode, kind: ErrorKind, message: &str) -> Response {
    let body = serde_json::json!({
        "type": "error",
        "error": { "type": kind.wire_type(), "message": message },
    });
    (status, axum::Json(body)).into_response()
}

fn extract_candidate_key<B>(req: &Request<B>) -> Result<Option<String>, Response> {
    if let Some(value) = req.headers().get("x-api-key") {
        return Ok(value.to_str().ok().map(|s| s.to_string()));
    }
    if let Some(value) = req.headers().get(axum::http::header::AUTHORIZATION) {
        let raw = value.to_str().unwrap_or_default();
        return match raw.strip_prefix("Bearer ") {
            Some(key) => Ok(Some(key.to_string())),
            None => Err(error_response(
                StatusCode::UNAUTHORIZED,
                ErrorKind::Authentication,
                "Invalid Authorization header format",
            )),
        };
    }
    Ok(None)
}

/// Runs the five checks in `§4.6` in order; short-circuits on the first
/// that fails.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if req.uri().path() == "/health" {
        return next.run(req).await;
    }

    let expected = &state.config.proxy_api_key;
    if expected.is_empty() {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Api,
            "Server misconfigured",
        );
    }

    let candidate = match extract_candidate_key(&req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let candidate = match candidate {
        Some(c) if !c.is_empty() => c,
        _ => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                ErrorKind::Authentication,
                "Missing API key",
            );
        }
    };

    if candidate.as_bytes().ct_eq(expected.as_bytes()).unwrap_u8() != 1 {
        return error_response(
            StatusCode::UNAUTHORIZED,
            ErrorKind::Authentication,
            "Invalid API key",
        );
    }

    next.run(req).await
}

/// Used directly by handlers that need to classify an already-built
/// [`GatewayError`] the same way auth failures are rendered.
pub fn render_gateway_error(err: &GatewayError) -> Response {
    let classified = crate::error::classify_gateway_error(err);
    (
        axum::http::StatusCode::from_u16(classified.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        axum::Json(classified.body()),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    #[test]
    fn extract_prefers_x_api_key_header() {
        let req = HttpRequest::builder()
            .header("x-api-key", "k1")
            .header("authorization", "Bearer k2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_candidate_key(&req).unwrap(), Some("k1".to_string()));
    }

    #[test]
    fn extract_falls_back_to_bearer_authorization() {
        let req = HttpRequest::builder()
            .header("authorization", "Bearer k2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_candidate_key(&req).unwrap(), Some("k2".to_string()));
    }

    #[test]
    fn extract_rejects_non_bearer_authorization() {
        let req = HttpRequest::builder()
            .header("authorization", "Basic abc")
            .body(Body::empty())
            .unwrap();
        assert!(extract_candidate_key(&req).is_err());
    }

    #[test]
    fn extract_returns_none_when_no_header_present() {
        let req = HttpRequest::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_candidate_key(&req).unwrap(), None);
    }
}
