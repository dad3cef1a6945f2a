//! The `Provider` capability every upstream adapter implements.
//!
//! A concrete adapter (Cloud-Code-style Gemini/Claude, Z.AI, the Antigravity
//! account pool, …) is out of scope here — this module only specifies the
//! polymorphic interface the registry, resolver, and request pipeline are
//! written against.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::error::Result;
use crate::types::{AnthropicRequest, AnthropicResponse, ImageGenerateRequest, ImageGenerateResponse, StreamEvent};

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Liveness snapshot returned by [`Provider::get_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Available,
    Unavailable { reason: String },
}

/// The capability set an upstream adapter implements: identity, supported
/// model list, unary send, streaming send, model listing, image
/// generation, and lifecycle hooks.
///
/// `generate_image` is only meaningfully implemented by the Antigravity
/// variant; every other variant inherits the default `Unsupported` error.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name as it appears in public model ids (`"<name>/<raw>"`).
    /// Unique within a registry.
    fn name(&self) -> &str;

    /// Raw model ids this provider understands. Stable across the life of
    /// the process — callers may cache the result.
    fn models(&self) -> Vec<String>;

    /// Whether `raw_model` is one this provider understands. Default
    /// implementation scans [`models`](Self::models); override for
    /// providers with a cheaper membership check.
    fn supports_model(&self, raw_model: &str) -> bool {
        self.models().iter().any(|m| m == raw_model)
    }

    /// Unary send. `raw_model` has already had the `<provider>/` prefix
    /// stripped by the resolver.
    async fn send_message(&self, request: &AnthropicRequest, raw_model: &str) -> Result<AnthropicResponse>;

    /// Streaming send. Each item is one event to forward to the client.
    async fn send_message_stream(
        &self,
        request: &AnthropicRequest,
        raw_model: &str,
    ) -> Result<EventStream>;

    /// Live model listing, refreshed from the upstream on each call.
    /// Defaults to the static [`models`](Self::models) list when the
    /// provider has no live catalog endpoint.
    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(self.models())
    }

    /// Liveness check, consulted by `/health` and `/account-limits`.
    async fn get_status(&self) -> ProviderStatus {
        ProviderStatus::Available
    }

    /// Image generation. Only the Antigravity provider is expected to
    /// implement this meaningfully.
    async fn generate_image(&self, _request: &ImageGenerateRequest) -> Result<ImageGenerateResponse> {
        Err(crate::error::GatewayError::NotImplemented(format!(
            "{} does not support image generation",
            self.name()
        )))
    }

    /// Called once at registration time.
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Called once at process teardown.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StubProvider {
        name: &'static str,
        models: Vec<&'static str>,
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn models(&self) -> Vec<String> {
            self.models.iter().map(|s| s.to_string()).collect()
        }

        async fn send_message(&self, _request: &AnthropicRequest, _raw_model: &str) -> Result<AnthropicResponse> {
            Ok(AnthropicResponse::new("msg_1", self.name, vec![]))
        }

        async fn send_message_stream(
            &self,
            _request: &AnthropicRequest,
            _raw_model: &str,
        ) -> Result<EventStream> {
            Err(crate::error::GatewayError::Internal("unused in test".into()))
        }
    }

    #[tokio::test]
    async fn default_generate_image_is_unsupported() {
        let provider = StubProvider {
            name: "zai",
            models: vec!["claude-sonnet-4-5"],
        };
        let req = ImageGenerateRequest {
            model: None,
            prompt: "a cat".into(),
            n: 1,
        };
        let err = provider.generate_image(&req).await.unwrap_err();
        assert!(matches!(err, crate::error::GatewayError::NotImplemented(_)));
    }

    #[tokio::test]
    async fn supports_model_checks_the_static_list() {
        let provider = StubProvider {
            name: "antigravity",
            models: vec!["claude-3-5-sonnet-20241022"],
        };
        assert!(provider.supports_model("claude-3-5-sonnet-20241022"));
        assert!(!provider.supports_model("unknown"));
    }

    #[tokio::test]
    async fn default_status_is_available() {
        let provider = StubProvider {
            name: "antigravity",
            models: vec![],
        };
        assert_eq!(provider.get_status().await, ProviderStatus::Available);
    }
}
