//! `POST /v1/messages` and `POST /v1/messages/count_tokens`.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;

use crate::error::{ErrorKind, GatewayError};
use crate::providers::resolve;
use crate::server::handlers::{error_response, gateway_error_response, shape_provider_error};
use crate::server::sse;
use crate::server::state::AppState;
use crate::types::{AnthropicRequest, StreamEvent, validate_messages_is_array};

/// `413`/`400` checks on the raw body, resolution, the optimistic-retry
/// policy, then dispatch — unary or streaming depending on `stream`.
pub async fn send_message(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    if body.len() > state.config.request_body_limit {
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::InvalidRequest,
            "request body too large",
        );
    }

    if !validate_messages_is_array(&body) {
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorKind::InvalidRequest,
            "messages is required and must be an array",
        );
    }

    let mut request: AnthropicRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(err) => {
            return error_response(StatusCode::BAD_REQUEST, ErrorKind::InvalidRequest, err.to_string());
        }
    };
    request.normalize();
    let public_model = request.model.clone();

    let resolved = match resolve(&state.registry, &public_model) {
        Ok(r) => r,
        Err(err) => return gateway_error_response(&err),
    };

    // Optimistic retry: if every account of this provider is currently
    // rate-limited on the raw model, force a fresh probe before dispatch.
    if state
        .accounts
        .is_all_rate_limited_by_provider(resolved.provider.name(), &resolved.raw_model)
    {
        state
            .accounts
            .reset_all_rate_limits_by_provider(resolved.provider.name());
    }

    if request.stream {
        stream_response(state, resolved, request, public_model).await
    } else {
        unary_response(&state, resolved, &request, public_model).await
    }
}

async fn unary_response(
    state: &AppState,
    resolved: crate::providers::Resolved,
    request: &AnthropicRequest,
    public_model: String,
) -> Response {
    let provider_name = resolved.provider.name().to_string();
    let started = std::time::Instant::now();
    let outcome = resolved.provider.send_message(request, &resolved.raw_model).await;

    metrics::histogram!(crate::telemetry::REQUEST_DURATION_SECONDS, "provider" => provider_name.clone())
        .record(started.elapsed().as_secs_f64());

    match outcome {
        Ok(mut resp) => {
            metrics::counter!(crate::telemetry::REQUESTS_TOTAL, "provider" => provider_name.clone(), "status" => "ok")
                .increment(1);
            metrics::counter!(crate::telemetry::TOKENS_TOTAL, "provider" => provider_name.clone(), "direction" => "input")
                .increment(resp.usage.input_tokens as u64);
            metrics::counter!(crate::telemetry::TOKENS_TOTAL, "provider" => provider_name, "direction" => "output")
                .increment(resp.usage.output_tokens as u64);
            resp.model = public_model;
            axum::Json(resp).into_response()
        }
        Err(err) => {
            metrics::counter!(crate::telemetry::REQUESTS_TOTAL, "provider" => provider_name, "status" => "error")
                .increment(1);
            shape_provider_error(&state.accounts, &err)
        }
    }
}

async fn stream_response(
    state: Arc<AppState>,
    resolved: crate::providers::Resolved,
    request: AnthropicRequest,
    public_model: String,
) -> Response {
    let upstream = match resolved
        .provider
        .send_message_stream(&request, &resolved.raw_model)
        .await
    {
        Ok(stream) => stream,
        // Headers not committed yet: an error before the first frame still
        // renders as a normal JSON error response.
        Err(err) => return shape_provider_error(&state.accounts, &err),
    };

    let accounts = state.clone();
    let frames = upstream
        .map(move |item| match item {
            Ok(mut event) => {
                event.rewrite_model(&public_model);
                sse::render(&event)
            }
            Err(err) => {
                let classified = classify_auth_aware(&accounts.accounts, &err);
                sse::render(&StreamEvent::Error(classified))
            }
        })
        .map(|frame| Ok::<_, Infallible>(Bytes::from(frame)));
    let body = Body::from_stream(frames);

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache"),
    );
    headers.insert(axum::http::header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    response
}

/// Mirrors [`crate::server::handlers::shape_provider_error`] for a mid-stream
/// error event: clears both caches and appends the invalidation note when
/// classified as authentication.
fn classify_auth_aware(accounts: &crate::account::AccountManager, err: &GatewayError) -> crate::error::Classified {
    let mut classified = crate::error::classify_gateway_error(err);
    if classified.kind == ErrorKind::Authentication {
        accounts.clear_token_cache("");
        accounts.clear_project_cache("");
        classified.message = format!("{} (caches cleared)", classified.message);
    }
    classified
}

/// Explicitly constant: token counting is out of scope.
pub async fn count_tokens() -> Response {
    let body = serde_json::json!({
        "type": "error",
        "error": { "type": "not_implemented", "message": "count_tokens is not implemented" },
    });
    (StatusCode::NOT_IMPLEMENTED, axum::Json(body)).into_response()
}
