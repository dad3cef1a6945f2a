//! Wire types for the gateway's public HTTP surface.

pub mod content;
pub mod image;
pub mod message;
pub mod model;
pub mod response;
pub mod tool;

pub use content::{ContentBlock, PassthroughBlock, ThinkingBlock, ToolResultBlock, ToolUseBlock};
pub use image::{GeneratedImage, ImageGenerateRequest, ImageGenerateResponse};
pub use message::{AnthropicRequest, Message, MessageContent, Role, ThinkingConfig, validate_messages_is_array};
pub use model::{ModelInfo, ModelsPage, ModelsQuery, paginate};
pub use response::{AnthropicResponse, StopReason, StreamEvent, Usage};
pub use tool::{ToolChoice, ToolDefinition};
