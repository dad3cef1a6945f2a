//! Tool definitions for `/v1/messages` function calling.
//!
//! Tool *calls* and *results* travel as [`ContentBlock`](super::content::ContentBlock)
//! variants, not here — this module only covers what the client declares
//! up front: the tool catalog and the choice policy.

use serde::{Deserialize, Serialize};

/// A tool the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
    /// Prompt-cache directive (e.g. `{"type": "ephemeral"}`); passed
    /// through to providers that support prompt caching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<serde_json::Value>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, input_schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema,
            cache_control: None,
        }
    }
}

/// How the model should choose which tool, if any, to call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
    Any,
    None,
    Tool { name: String },
}

impl Default for ToolChoice {
    fn default() -> Self {
        Self::Auto
    }
}
