//! The HTTP request pipeline: router assembly, middleware, and handlers.

pub mod handlers;
pub mod middleware;
pub mod sse;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::catch_panic::CatchPanicLayer;

pub use state::AppState;

/// Assembles the full router: every handler wrapped by auth, CORS,
/// recovery and logging, in that order (outermost to innermost as a
/// request arrives: logger, recovery, CORS, auth, then the handler).
pub fn build_router(state: Arc<AppState>) -> Router {
    let app = Router::new()
        .route("/v1/messages", post(handlers::messages::send_message))
        .route(
            "/v1/messages/count_tokens",
            post(handlers::messages::count_tokens),
        )
        .route("/v1/models", get(handlers::models::list_models))
        .route(
            "/v1/images/generate",
            post(handlers::images::generate_image),
        )
        .route("/health", get(handlers::health::health))
        .route("/account-limits", get(handlers::health::account_limits))
        .route("/refresh-token", post(handlers::refresh::refresh_token))
        .fallback(handlers::not_found)
        .with_state(state.clone())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_api_key,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::cors::apply,
        ))
        .layer(CatchPanicLayer::custom(middleware::recover::panic_response))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::logger::log_requests,
        ));

    app
}
