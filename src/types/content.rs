//! Anthropic content blocks.
//!
//! The wire model preserves block types the gateway doesn't otherwise know
//! about by type-copy rather than dropping them — see [`ContentBlock::Passthrough`].

use serde::{Deserialize, Serialize, de::Error as _};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ThinkingBlock {
    pub thinking: String,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolUseBlock {
    pub id: String,
    pub name: String,
    pub input: Value,
    /// Carried through verbatim when the upstream payload set it.
    pub thought_signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolResultBlock {
    pub tool_use_id: String,
    pub content: Value,
    pub is_error: Option<bool>,
}

/// An unknown block type, preserved as a type-copy of the original JSON
/// object rather than discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct PassthroughBlock {
    pub kind: String,
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(String),
    Thinking(ThinkingBlock),
    ToolUse(ToolUseBlock),
    ToolResult(ToolResultBlock),
    Passthrough(PassthroughBlock),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self::ToolUse(ToolUseBlock {
            id: id.into(),
            name: name.into(),
            input,
            thought_signature: None,
        })
    }

    pub fn is_empty_text(&self) -> bool {
        matches!(self, Self::Text(t) if t.is_empty())
    }
}

impl Serialize for ContentBlock {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        match self {
            Self::Text(text) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "text")?;
                map.serialize_entry("text", text)?;
                map.end()
            }
            Self::Thinking(block) => {
                let len = if block.signature.is_some() { 3 } else { 2 };
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("type", "thinking")?;
                map.serialize_entry("thinking", &block.thinking)?;
                if let Some(sig) = &block.signature {
                    map.serialize_entry("signature", sig)?;
                }
                map.end()
            }
            Self::ToolUse(block) => {
                let len = if block.thought_signature.is_some() { 4 } else { 3 };
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("type", "tool_use")?;
                map.serialize_entry("id", &block.id)?;
                map.serialize_entry("name", &block.name)?;
                map.serialize_entry("input", &block.input)?;
                if let Some(sig) = &block.thought_signature {
                    map.serialize_entry("thoughtSignature", sig)?;
                }
                map.end()
            }
            Self::ToolResult(block) => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("type", "tool_result")?;
                map.serialize_entry("tool_use_id", &block.tool_use_id)?;
                map.serialize_entry("content", &block.content)?;
                if let Some(is_error) = block.is_error {
                    map.serialize_entry("is_error", &is_error)?;
                }
                map.end()
            }
            Self::Passthrough(block) => block.raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let kind = value.get("type").and_then(Value::as_str).unwrap_or("");

        match kind {
            "text" => {
                let text = value
                    .get("text")
                    .and_then(Value::as_str)
                    .ok_or_else(|| D::Error::custom("text block missing 'text'"))?;
                Ok(Self::Text(text.to_string()))
            }
            "thinking" => Ok(Self::Thinking(ThinkingBlock {
                thinking: value
                    .get("thinking")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                signature: value
                    .get("signature")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })),
            "tool_use" => Ok(Self::ToolUse(ToolUseBlock {
                id: value
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                name: value
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                input: value.get("input").cloned().unwrap_or(Value::Null),
                thought_signature: value
                    .get("thoughtSignature")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })),
            "tool_result" => Ok(Self::ToolResult(ToolResultBlock {
                tool_use_id: value
                    .get("tool_use_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                content: value.get("content").cloned().unwrap_or(Value::Null),
                is_error: value.get("is_error").and_then(Value::as_bool),
            })),
            other => Ok(Self::Passthrough(PassthroughBlock {
                kind: other.to_string(),
                raw: value,
            })),
        }
    }
}
