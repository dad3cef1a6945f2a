//! Gateway error taxonomy and the upstream error classifier.
//!
//! Upstream providers fail in incompatible ways — gRPC status strings, HTTP
//! status codes embedded in prose, bare JSON blobs. [`classify`] reduces all
//! of that to the closed [`ErrorKind`] taxonomy the rest of the gateway is
//! written against.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde_json::{Value, json};

/// Closed error taxonomy. Every response the gateway emits carries one of
/// these as its wire `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    InvalidRequest,
    Authentication,
    Permission,
    NotFound,
    RateLimit,
    Api,
    Overloaded,
}

impl ErrorKind {
    /// Wire `type` string used in the Anthropic-shaped error body.
    pub fn wire_type(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request_error",
            Self::Authentication => "authentication_error",
            Self::Permission => "permission_error",
            Self::NotFound => "not_found_error",
            Self::RateLimit => "rate_limit_error",
            Self::Api => "api_error",
            Self::Overloaded => "overloaded_error",
        }
    }

    /// Default HTTP status for this kind. A classifier-supplied override wins
    /// over this mapping.
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidRequest => 400,
            Self::Authentication => 401,
            Self::Permission => 403,
            Self::NotFound => 404,
            Self::RateLimit => 429,
            Self::Overloaded => 503,
            Self::Api => 500,
        }
    }
}

/// The gateway's own internal error type. Structural variants (body too
/// large, bad JSON, etc.) already know their kind; [`Upstream`](Self::Upstream)
/// carries raw provider error text that still needs [`classify`].
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("server misconfigured")]
    Misconfigured,

    #[error("missing API key")]
    MissingApiKey,

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeaderFormat,

    #[error("request body too large")]
    BodyTooLarge,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("{0}")]
    Configuration(String),

    /// Raw text from an upstream provider failure. Routed through
    /// [`classify`] before it reaches a caller.
    #[error("{0}")]
    Upstream(String),

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Whether a retry of the same request might succeed. Used by the
    /// optimistic-retry policy and by provider-facing retry decorators.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Upstream(_) | Self::Internal(_)
        )
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::InvalidRequest(format!("invalid JSON: {err}"))
    }
}

/// Result of classifying an error: the taxonomy kind, a caller-facing
/// message, and an optional status override that wins over `kind.status()`.
#[derive(Debug, Clone)]
pub struct Classified {
    pub kind: ErrorKind,
    pub message: String,
    pub status_override: Option<u16>,
}

impl Classified {
    pub fn status(&self) -> u16 {
        self.status_override.unwrap_or(self.kind.status())
    }

    /// The Anthropic-shaped error body: `{"type":"error","error":{"type":...,"message":...}}`.
    pub fn body(&self) -> Value {
        json!({
            "type": "error",
            "error": {
                "type": self.kind.wire_type(),
                "message": self.message,
            }
        })
    }

    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_override: None,
        }
    }

    fn with_status(mut self, status: u16) -> Self {
        self.status_override = Some(status);
        self
    }
}

fn rate_limit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)model[" :=]+([a-zA-Z0-9._/-]+)|retry[-_ ]?after[" :=]+(\d+)"#).unwrap()
    })
}

fn message_field_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""message"\s*:\s*"([^"]*)""#).unwrap())
}

/// Humanize a 429/quota-exhausted error: pull out a model name and/or a
/// retry duration if present, otherwise fall back to the raw text.
fn humanize_rate_limit(text: &str) -> String {
    let caps = rate_limit_regex().captures(text);
    match caps {
        Some(c) if c.get(1).is_some() || c.get(2).is_some() => {
            let model = c.get(1).map(|m| m.as_str());
            let retry = c.get(2).map(|m| m.as_str());
            match (model, retry) {
                (Some(m), Some(r)) => format!("rate limited on model '{m}', retry after {r}s"),
                (Some(m), None) => format!("rate limited on model '{m}'"),
                (None, Some(r)) => format!("rate limited, retry after {r}s"),
                (None, None) => text.to_string(),
            }
        }
        _ => text.to_string(),
    }
}

/// Pull `"message":"…"` out of a JSON tail, if the text has one.
fn extract_message_field(text: &str) -> String {
    message_field_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| text.to_string())
}

/// Classify an arbitrary upstream error into the closed taxonomy.
///
/// Rules are evaluated in order; the first match wins. This function is
/// pure and deliberately substring-based — the rule order is part of the
/// public contract (see design notes on open questions: a message that
/// happens to contain `"401"` for an unrelated reason will still be
/// classified as an authentication error).
pub fn classify(text: &str) -> Classified {
    let lower = text.to_lowercase();

    if text.contains("401") || text.contains("UNAUTHENTICATED") {
        return Classified::new(ErrorKind::Authentication, "authentication failed");
    }
    if text.contains("429") || text.contains("RESOURCE_EXHAUSTED") || text.contains("QUOTA_EXHAUSTED")
    {
        return Classified::new(ErrorKind::InvalidRequest, humanize_rate_limit(text));
    }
    if text.contains("invalid_request_error") || text.contains("INVALID_ARGUMENT") {
        return Classified::new(ErrorKind::InvalidRequest, extract_message_field(text));
    }
    if text.contains("All endpoints failed") {
        return Classified::new(ErrorKind::Api, "all upstream endpoints failed").with_status(503);
    }
    if text.contains("PERMISSION_DENIED") {
        return Classified::new(ErrorKind::Permission, "operation not permitted under current license");
    }
    if ["auth", "token", "401", "403", "unauthenticated"]
        .iter()
        .any(|s| lower.contains(s))
    {
        return Classified::new(ErrorKind::Authentication, text);
    }
    if ["overloaded", "503", "service unavailable"]
        .iter()
        .any(|s| lower.contains(s))
    {
        return Classified::new(ErrorKind::Overloaded, text);
    }
    if lower.contains("not found") || lower.contains("404") {
        return Classified::new(ErrorKind::NotFound, text);
    }
    if lower.contains("invalid") || lower.contains("bad request") || lower.contains("400") {
        return Classified::new(ErrorKind::InvalidRequest, text);
    }
    Classified::new(ErrorKind::Api, text)
}

/// Convert a [`GatewayError`] into the taxonomy, routing [`GatewayError::Upstream`]
/// through [`classify`] and giving every structural variant its fixed kind.
pub fn classify_gateway_error(err: &GatewayError) -> Classified {
    match err {
        GatewayError::Upstream(text) => classify(text),
        GatewayError::InvalidRequest(msg) => Classified::new(ErrorKind::InvalidRequest, msg.clone()),
        GatewayError::Misconfigured => {
            Classified::new(ErrorKind::Api, "Server misconfigured").with_status(500)
        }
        GatewayError::MissingApiKey => {
            Classified::new(ErrorKind::Authentication, "Missing API key")
        }
        GatewayError::InvalidApiKey => Classified::new(ErrorKind::Authentication, "Invalid API key"),
        GatewayError::InvalidAuthHeaderFormat => {
            Classified::new(ErrorKind::Authentication, "Invalid Authorization header format")
        }
        GatewayError::BodyTooLarge => {
            Classified::new(ErrorKind::InvalidRequest, "request body too large").with_status(413)
        }
        GatewayError::NotFound(msg) => Classified::new(ErrorKind::NotFound, msg.clone()),
        GatewayError::NotImplemented(msg) => {
            Classified::new(ErrorKind::Api, msg.clone()).with_status(501)
        }
        GatewayError::Configuration(msg) => Classified::new(ErrorKind::Api, msg.clone()),
        GatewayError::RateLimited { .. } => {
            Classified::new(ErrorKind::RateLimit, "rate limited by upstream provider")
        }
        GatewayError::Internal(msg) => Classified::new(ErrorKind::Api, msg.clone()),
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
