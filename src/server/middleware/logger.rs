//! Request logging: method, path, client address, status, duration.
//!
//! `/health` is suppressed unless `debug` is on, so a polling monitor
//! doesn't flood the log at whatever interval it's configured for.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::server::state::AppState;

pub async fn log_requests(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let client = connect_info.map(|ConnectInfo(addr)| addr.to_string());

    let started = Instant::now();
    let response = next.run(req).await;
    let elapsed = started.elapsed();

    if path == "/health" && !state.config.debug {
        return response;
    }

    tracing::info!(
        method = %method,
        path = %path,
        client = client.as_deref().unwrap_or("unknown"),
        status = response.status().as_u16(),
        duration_ms = elapsed.as_millis() as u64,
        "request",
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, AccountManager, SoftLimitPolicy, token_source::FakeTokenSource};
    use crate::config::Config;
    use crate::providers::ProviderRegistry;
    use axum::body::Body;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn state(debug: bool) -> Arc<AppState> {
        let accounts = AccountManager::new(
            vec![Account::new_manual("a@x.com", "antigravity", "k")],
            SoftLimitPolicy::disabled(),
            Arc::new(FakeTokenSource { should_fail: false }),
        );
        AppState::new(
            ProviderRegistry::new(),
            accounts,
            Config {
                proxy_api_key: "k".to_string(),
                cors: Default::default(),
                request_body_limit: 1024,
                quota_fetch_timeout: std::time::Duration::from_millis(100),
                debug,
            },
        )
    }

    #[tokio::test]
    async fn request_reaches_the_handler_regardless_of_logging() {
        let app_state = state(false);
        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .with_state(app_state.clone())
            .layer(axum::middleware::from_fn_with_state(app_state, log_requests));

        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), axum::http::StatusCode::OK);
    }
}
