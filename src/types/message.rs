//! Request-side wire types for `/v1/messages`.

use serde::{Deserialize, Serialize};

use super::content::ContentBlock;
use super::tool::{ToolChoice, ToolDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Message content accepts either a bare string or an array of content
/// blocks — both are legal on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    pub fn as_blocks(&self) -> Vec<ContentBlock> {
        match self {
            Self::Text(text) => vec![ContentBlock::text(text.clone())],
            Self::Blocks(blocks) => blocks.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }
}

/// Extended-thinking configuration, passed through to providers that
/// support it and otherwise ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThinkingConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_tokens: Option<u32>,
}

fn default_model() -> String {
    "antigravity/claude-3-5-sonnet-20241022".to_string()
}

/// The `/v1/messages` request body.
///
/// Deserialized with serde defaults matching §3's invariants: `model`
/// defaults to the antigravity alias, `max_tokens` is coerced to 4096 when
/// absent or zero by [`AnthropicRequest::normalize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicRequest {
    #[serde(default = "default_model")]
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub max_tokens: u32,
    #[serde(default)]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl AnthropicRequest {
    /// `max_tokens == 0` (including absent, which deserializes to 0) falls
    /// back to 4096.
    pub fn normalize(&mut self) {
        if self.max_tokens == 0 {
            self.max_tokens = 4096;
        }
    }
}

/// Examines the raw `messages` value to decide whether it was a JSON array,
/// ahead of full struct deserialization.
///
/// Callers return the fixed message `"messages is required and must be an
/// array"` regardless of whether the field is missing, null, or present
/// with the wrong shape, so the raw body is checked before deserializing
/// into [`AnthropicRequest`].
pub fn validate_messages_is_array(body: &[u8]) -> bool {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(_) => return false,
    };
    matches!(value.get("messages"), Some(serde_json::Value::Array(_)))
}
