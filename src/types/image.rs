//! Wire types for `POST /v1/images/generate`.

use serde::{Deserialize, Serialize};

fn default_count() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageGenerateRequest {
    #[serde(default)]
    pub model: Option<String>,
    pub prompt: String,
    #[serde(default = "default_count")]
    pub n: u32,
}

impl ImageGenerateRequest {
    /// Non-empty prompt, default model, and `n` bounded to `[1, max]`.
    pub fn normalize(&mut self, default_model: &str, max_count: u32) {
        if self.model.as_deref().unwrap_or("").is_empty() {
            self.model = Some(default_model.to_string());
        }
        self.n = self.n.clamp(1, max_count);
    }

    pub fn is_valid(&self) -> bool {
        !self.prompt.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedImage {
    pub b64_json: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageGenerateResponse {
    pub model: String,
    pub data: Vec<GeneratedImage>,
}
