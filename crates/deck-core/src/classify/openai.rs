use serde::Deserialize;

use super::{EncodedImage, VisionModel};
use crate::error::ClassificationFailure;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// A single digit is all we ask for.
const MAX_TOKENS: u32 = 10;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// None sends nothing; every image classifies as unknown
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// OpenAI-compatible chat completions client for image classification.
pub struct OpenAiVision {
    config: OpenAiConfig,
    client: reqwest::blocking::Client,
}

impl OpenAiVision {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: reqwest::blocking::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, prompt: &str, image: &EncodedImage) -> serde_json::Value {
        serde_json::json!({
            "model": &self.config.model,
            "max_tokens": MAX_TOKENS,
            "temperature": 0,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": prompt},
                    {"type": "image_url", "image_url": {"url": image.data_url()}}
                ]
            }]
        })
    }
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}
#[derive(Deserialize)]
struct Choice {
    message: Message,
}
#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

fn reply_text(response: ApiResponse) -> Result<String, ClassificationFailure> {
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.unwrap_or_default())
        .ok_or(ClassificationFailure::EmptyResponse)
}

impl VisionModel for OpenAiVision {
    fn complete(&self, prompt: &str, image: &EncodedImage) -> Result<String, ClassificationFailure> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ClassificationFailure::MissingCredentials)?;

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&self.request_body(prompt, image))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassificationFailure::Status { status: status.as_u16(), body });
        }

        reply_text(response.json()?)
    }
}
