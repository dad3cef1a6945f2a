//! Response and streaming event types for `/v1/messages`.

use serde::{Deserialize, Serialize};

use super::content::ContentBlock;

/// Token usage, including Anthropic's cache accounting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    #[default]
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
}

/// The non-streaming `/v1/messages` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub role: String,
    /// At least one block is always present — an empty text block is
    /// synthesized when the provider returned no content.
    pub content: Vec<ContentBlock>,
    pub model: String,
    pub stop_reason: StopReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequence: Option<String>,
    pub usage: Usage,
}

impl AnthropicResponse {
    pub fn new(id: impl Into<String>, model: impl Into<String>, mut content: Vec<ContentBlock>) -> Self {
        if content.is_empty() {
            content.push(ContentBlock::text(""));
        }
        Self {
            id: id.into(),
            kind: "message".to_string(),
            role: "assistant".to_string(),
            content,
            model: model.into(),
            stop_reason: StopReason::EndTurn,
            stop_sequence: None,
            usage: Usage::default(),
        }
    }
}

/// An event in a `/v1/messages` SSE stream.
///
/// Exactly one of the body-carrying variants is populated per frame:
/// either a structured event the gateway can rewrite
/// ([`Message`](StreamEvent::Message)), an arbitrary provider-native
/// payload ([`Raw`](StreamEvent::Raw)), or a terminal
/// [`Error`](StreamEvent::Error).
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Message {
        event_type: String,
        message: serde_json::Value,
    },
    /// An upstream payload passed through mostly as-is. If it contains a
    /// `message` sub-object, that sub-object's `model` field is rewritten.
    Raw {
        event_type: Option<String>,
        body: serde_json::Value,
    },
    /// A terminal error; rendered as an `event: error` SSE frame.
    Error(crate::error::Classified),
}

impl StreamEvent {
    /// Rewrite the `model` field to the public model id. This is the only
    /// in-place edit of upstream payloads the pipeline makes.
    pub fn rewrite_model(&mut self, public_model: &str) {
        match self {
            Self::Message { message, .. } => {
                if let Some(obj) = message.as_object_mut() {
                    obj.insert(
                        "model".to_string(),
                        serde_json::Value::String(public_model.to_string()),
                    );
                }
            }
            Self::Raw { body, .. } => {
                if let Some(msg) = body.get_mut("message").and_then(|v| v.as_object_mut()) {
                    msg.insert(
                        "model".to_string(),
                        serde_json::Value::String(public_model.to_string()),
                    );
                }
            }
            Self::Error(_) => {}
        }
    }

    /// SSE event type name. Defaults to `"message"` when the provider did
    /// not specify one.
    pub fn event_type(&self) -> String {
        match self {
            Self::Message { event_type, .. } => event_type.clone(),
            Self::Raw { event_type, .. } => {
                event_type.clone().unwrap_or_else(|| "message".to_string())
            }
            Self::Error(_) => "error".to_string(),
        }
    }

    /// The JSON body to serialize for the `data:` line.
    pub fn data(&self) -> serde_json::Value {
        match self {
            Self::Message { message, .. } => message.clone(),
            Self::Raw { body, .. } => body.clone(),
            Self::Error(classified) => classified.body(),
        }
    }
}
