//! End-to-end tests driving the assembled router through `tower::ServiceExt::oneshot`,
//! covering the auth/CORS/recovery layering and the handlers' HTTP-visible contracts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use waystation::account::{Account, AccountManager, SoftLimitPolicy, TokenSource};
use waystation::config::{Config, CorsConfig};
use waystation::error::{GatewayError, Result};
use waystation::providers::{EventStream, Provider, ProviderRegistry};
use waystation::server::{AppState, build_router};
use waystation::types::{AnthropicRequest, AnthropicResponse, ImageGenerateRequest, ImageGenerateResponse};

struct StubTokenSource;

#[async_trait]
impl TokenSource for StubTokenSource {
    async fn refresh(&self, refresh_token: &str) -> Result<String> {
        Ok(format!("token-for-{refresh_token}"))
    }
}

struct FailingTokenSource;

#[async_trait]
impl TokenSource for FailingTokenSource {
    async fn refresh(&self, _refresh_token: &str) -> Result<String> {
        Err(GatewayError::Upstream("authentication failed: refresh rejected".to_string()))
    }
}

/// A provider whose unary/stream/image behavior is fixed at construction,
/// enough to exercise success and failure paths through the full router.
struct StubProvider {
    name: &'static str,
    models: Vec<&'static str>,
    fail_with: Option<GatewayError>,
}

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn models(&self) -> Vec<String> {
        self.models.iter().map(|m| m.to_string()).collect()
    }

    async fn send_message(&self, _request: &AnthropicRequest, raw_model: &str) -> Result<AnthropicResponse> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let mut resp = AnthropicResponse::new("msg_1", raw_model, vec![]);
        resp.usage.input_tokens = 10;
        resp.usage.output_tokens = 5;
        Ok(resp)
    }

    async fn send_message_stream(&self, _request: &AnthropicRequest, _raw_model: &str) -> Result<EventStream> {
        Err(GatewayError::Internal("streaming unused in this test".into()))
    }

    async fn generate_image(&self, _request: &ImageGenerateRequest) -> Result<ImageGenerateResponse> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(ImageGenerateResponse {
            model: "antigravity/image-default".to_string(),
            data: vec![waystation::types::GeneratedImage {
                b64_json: "aGVsbG8=".to_string(),
            }],
        })
    }
}

fn config(api_key: &str) -> Config {
    Config {
        proxy_api_key: api_key.to_string(),
        cors: CorsConfig::default(),
        request_body_limit: 10 * 1024 * 1024,
        quota_fetch_timeout: Duration::from_millis(200),
        debug: false,
    }
}

fn app_with(provider: StubProvider, api_key: &str) -> Arc<AppState> {
    let registry = ProviderRegistry::new();
    registry.register(Arc::new(provider)).unwrap();
    let accounts = AccountManager::new(
        vec![Account::new_manual("a@example.com", "antigravity", "upstream-key")],
        SoftLimitPolicy::disabled(),
        Arc::new(StubTokenSource),
    );
    AppState::new(registry, accounts, config(api_key))
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_api_key_is_rejected() {
    let app = build_router(app_with(
        StubProvider { name: "antigravity", models: vec!["claude-3-5-sonnet-20241022"], fail_with: None },
        "secret",
    ));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/messages")
        .header("content-type", "application/json")
        .body(Body::from(json!({"messages": []}).to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["message"], "Missing API key");
}

#[tokio::test]
async fn wrong_api_key_is_rejected_in_constant_time_path() {
    let app = build_router(app_with(
        StubProvider { name: "antigravity", models: vec!["claude-3-5-sonnet-20241022"], fail_with: None },
        "secret",
    ));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/messages")
        .header("x-api-key", "wrong")
        .header("content-type", "application/json")
        .body(Body::from(json!({"messages": []}).to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["message"], "Invalid API key");
}

#[tokio::test]
async fn non_bearer_authorization_header_is_rejected() {
    let app = build_router(app_with(
        StubProvider { name: "antigravity", models: vec!["claude-3-5-sonnet-20241022"], fail_with: None },
        "secret",
    ));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/messages")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .header("content-type", "application/json")
        .body(Body::from(json!({"messages": []}).to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["message"], "Invalid Authorization header format");
}

#[tokio::test]
async fn empty_proxy_api_key_means_misconfigured() {
    let app = build_router(app_with(
        StubProvider { name: "antigravity", models: vec!["claude-3-5-sonnet-20241022"], fail_with: None },
        "",
    ));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/messages")
        .header("x-api-key", "anything")
        .body(Body::from(json!({"messages": []}).to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_is_reachable_without_any_api_key() {
    let app = build_router(app_with(
        StubProvider { name: "antigravity", models: vec!["claude-3-5-sonnet-20241022"], fail_with: None },
        "secret",
    ));

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["summary"]["total"], 1);
}

#[tokio::test]
async fn successful_unary_message_is_rewritten_with_public_model_id() {
    let app = build_router(app_with(
        StubProvider { name: "antigravity", models: vec!["claude-3-5-sonnet-20241022"], fail_with: None },
        "secret",
    ));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/messages")
        .header("x-api-key", "secret")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "model": "antigravity/claude-3-5-sonnet-20241022",
                "messages": [{"role": "user", "content": "hi"}],
            })
            .to_string(),
        ))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["model"], "antigravity/claude-3-5-sonnet-20241022");
    assert_eq!(body["usage"]["input_tokens"], 10);
}

#[tokio::test]
async fn unknown_model_falls_back_to_the_default_provider_rather_than_failing() {
    let app = build_router(app_with(
        StubProvider { name: "antigravity", models: vec!["claude-3-5-sonnet-20241022"], fail_with: None },
        "secret",
    ));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/messages")
        .header("x-api-key", "secret")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"model": "nope/nonexistent", "messages": [{"role": "user", "content": "hi"}]}).to_string(),
        ))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn no_registered_providers_is_a_bad_request() {
    let registry = ProviderRegistry::new();
    let accounts = AccountManager::new(vec![], SoftLimitPolicy::disabled(), Arc::new(StubTokenSource));
    let state = AppState::new(registry, accounts, config("secret"));
    let app = build_router(state);

    let req = Request::builder()
        .method("POST")
        .uri("/v1/messages")
        .header("x-api-key", "secret")
        .header("content-type", "application/json")
        .body(Body::from(json!({"messages": [{"role": "user", "content": "hi"}]}).to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_messages_field_is_rejected_before_resolution() {
    let app = build_router(app_with(
        StubProvider { name: "antigravity", models: vec!["claude-3-5-sonnet-20241022"], fail_with: None },
        "secret",
    ));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/messages")
        .header("x-api-key", "secret")
        .header("content-type", "application/json")
        .body(Body::from(json!({"model": "antigravity/claude-3-5-sonnet-20241022"}).to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["message"], "messages is required and must be an array");
}

#[tokio::test]
async fn authentication_error_from_provider_clears_caches_and_notes_it() {
    let app = build_router(app_with(
        StubProvider {
            name: "antigravity",
            models: vec!["claude-3-5-sonnet-20241022"],
            fail_with: Some(GatewayError::Upstream("401 UNAUTHENTICATED: token expired".to_string())),
        },
        "secret",
    ));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/messages")
        .header("x-api-key", "secret")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "model": "antigravity/claude-3-5-sonnet-20241022",
                "messages": [{"role": "user", "content": "hi"}],
            })
            .to_string(),
        ))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["type"], "authentication_error");
    assert!(body["error"]["message"].as_str().unwrap().contains("caches cleared"));
}

#[tokio::test]
async fn count_tokens_reports_not_implemented() {
    let app = build_router(app_with(
        StubProvider { name: "antigravity", models: vec!["claude-3-5-sonnet-20241022"], fail_with: None },
        "secret",
    ));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/messages/count_tokens")
        .header("x-api-key", "secret")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["type"], "not_implemented");
}

#[tokio::test]
async fn models_list_is_namespaced_by_provider() {
    let app = build_router(app_with(
        StubProvider { name: "antigravity", models: vec!["claude-3-5-sonnet-20241022", "claude-opus-4"], fail_with: None },
        "secret",
    ));

    let req = Request::builder()
        .uri("/v1/models")
        .header("x-api-key", "secret")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let ids: Vec<String> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap().to_string())
        .collect();
    assert!(ids.contains(&"antigravity/claude-3-5-sonnet-20241022".to_string()));
    assert!(ids.contains(&"antigravity/claude-opus-4".to_string()));
}

#[tokio::test]
async fn image_generation_succeeds_against_the_default_provider() {
    let app = build_router(app_with(
        StubProvider { name: "antigravity", models: vec!["claude-3-5-sonnet-20241022"], fail_with: None },
        "secret",
    ));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/images/generate")
        .header("x-api-key", "secret")
        .header("content-type", "application/json")
        .body(Body::from(json!({"prompt": "a cat wearing a hat"}).to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"][0]["b64_json"], "aGVsbG8=");
}

#[tokio::test]
async fn image_generation_rejects_empty_prompt() {
    let app = build_router(app_with(
        StubProvider { name: "antigravity", models: vec!["claude-3-5-sonnet-20241022"], fail_with: None },
        "secret",
    ));

    let req = Request::builder()
        .method("POST")
        .uri("/v1/images/generate")
        .header("x-api-key", "secret")
        .header("content-type", "application/json")
        .body(Body::from(json!({"prompt": ""}).to_string()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cors_preflight_short_circuits_with_configured_headers() {
    let app = build_router(app_with(
        StubProvider { name: "antigravity", models: vec!["claude-3-5-sonnet-20241022"], fail_with: None },
        "secret",
    ));

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/v1/messages")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
}

#[tokio::test]
async fn unmatched_route_falls_through_to_not_found() {
    let app = build_router(app_with(
        StubProvider { name: "antigravity", models: vec!["claude-3-5-sonnet-20241022"], fail_with: None },
        "secret",
    ));

    let req = Request::builder()
        .uri("/v1/whatever")
        .header("x-api-key", "secret")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refresh_token_reports_count_of_refreshed_oauth_accounts() {
    let registry = ProviderRegistry::new();
    registry
        .register(Arc::new(StubProvider {
            name: "antigravity",
            models: vec!["claude-3-5-sonnet-20241022"],
            fail_with: None,
        }))
        .unwrap();
    let accounts = AccountManager::new(
        vec![
            Account::new_oauth("oauth@example.com", "antigravity", "refresh-1"),
            Account::new_manual("manual@example.com", "antigravity", "static-key"),
        ],
        SoftLimitPolicy::disabled(),
        Arc::new(StubTokenSource),
    );
    let state = AppState::new(registry, accounts, config("secret"));
    let app = build_router(state);

    let req = Request::builder()
        .method("POST")
        .uri("/refresh-token")
        .header("x-api-key", "secret")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["refreshed"], 1);
}

#[tokio::test]
async fn refresh_token_fails_when_every_oauth_account_fails_to_refresh() {
    let registry = ProviderRegistry::new();
    registry
        .register(Arc::new(StubProvider {
            name: "antigravity",
            models: vec!["claude-3-5-sonnet-20241022"],
            fail_with: None,
        }))
        .unwrap();
    let accounts = AccountManager::new(
        vec![Account::new_oauth("oauth@example.com", "antigravity", "refresh-1")],
        SoftLimitPolicy::disabled(),
        Arc::new(FailingTokenSource),
    );
    let state = AppState::new(registry, accounts, config("secret"));
    let app = build_router(state);

    let req = Request::builder()
        .method("POST")
        .uri("/refresh-token")
        .header("x-api-key", "secret")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["type"], "authentication_error");
}
