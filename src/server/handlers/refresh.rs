//! `POST /refresh-token`.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::GatewayError;
use crate::server::handlers::gateway_error_response;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
struct RefreshReport {
    refreshed: usize,
}

/// Clears both caches, then refreshes every OAuth account. Succeeds as long
/// as at least one refresh (or there were none to attempt) didn't fail; if
/// there were OAuth accounts to refresh and every one of them failed, the
/// call itself fails.
pub async fn refresh_token(State(state): State<Arc<AppState>>) -> Response {
    let outcome = state.accounts.refresh_all_oauth().await;
    if !outcome.succeeded() {
        return gateway_error_response(&GatewayError::Upstream(
            "oauth refresh failed for all accounts".to_string(),
        ));
    }
    axum::Json(RefreshReport { refreshed: outcome.refreshed }).into_response()
}
