//! Configuration-driven CORS, applied uniformly rather than per-route.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::CorsConfig;
use crate::server::state::AppState;

fn add_headers(mut resp: Response, cors: &CorsConfig) -> Response {
    let headers = resp.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&cors.allow_origin) {
        headers.insert(HeaderName::from_static("access-control-allow-origin"), v);
    }
    if let Ok(v) = HeaderValue::from_str(&cors.allow_methods) {
        headers.insert(HeaderName::from_static("access-control-allow-methods"), v);
    }
    if let Ok(v) = HeaderValue::from_str(&cors.allow_headers) {
        headers.insert(HeaderName::from_static("access-control-allow-headers"), v);
    }
    if let Some(max_age) = cors.max_age {
        if let Ok(v) = HeaderValue::from_str(&max_age.to_string()) {
            headers.insert(HeaderName::from_static("access-control-max-age"), v);
        }
    }
    resp
}

/// When disabled: no headers added, `OPTIONS` passes through to the
/// handler untouched. When enabled: headers added to every response and
/// `OPTIONS` short-circuits with an empty `200`.
pub async fn apply(
    State(state): State<Arc<AppState>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let cors = &state.config.cors;
    if !cors.enabled {
        return next.run(req).await;
    }

    if req.method() == axum::http::Method::OPTIONS {
        return add_headers((StatusCode::OK, ()).into_response(), cors);
    }

    add_headers(next.run(req).await, cors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_headers_sets_all_configured_values() {
        let cors = CorsConfig {
            enabled: true,
            allow_origin: "https://example.com".to_string(),
            allow_methods: "GET, POST".to_string(),
            allow_headers: "content-type".to_string(),
            max_age: Some(600),
        };
        let resp = add_headers(StatusCode::OK.into_response(), &cors);
        assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "https://example.com");
        assert_eq!(resp.headers().get("access-control-max-age").unwrap(), "600");
    }
}
