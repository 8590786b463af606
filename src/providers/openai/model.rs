use serde::{Deserialize, Serialize};

use crate::errors::DecodeError;

// OpenAI-specific data structures for API communication
#[derive(Serialize, Debug)]
pub struct OpenAIRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<OpenAIResponseFormat>,
}

/// Set to `json_object` when the reply must be a single JSON object.
#[derive(Serialize, Debug)]
pub struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    pub format: String,
}

impl OpenAIResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format: "json_object".to_string(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct OpenAIMessage {
    pub role: String,
    pub content: OpenAIContent,
}

/// Message content is a bare string for text-only turns and a part list when
/// an image rides along.
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum OpenAIContent {
    Text(String),
    Parts(Vec<OpenAIContentPart>),
}

#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpenAIContentPart {
    Text { text: String },
    ImageUrl { image_url: OpenAIImageUrl },
}

#[derive(Serialize, Debug)]
pub struct OpenAIImageUrl {
    pub url: String,
}

// The response envelope is decoded field-by-field: any section the upstream
// left out deserializes to None/empty instead of failing the whole reply.
#[derive(Deserialize, Debug, Default)]
pub struct OpenAIResponse {
    #[serde(default)]
    pub choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize, Debug, Default)]
pub struct OpenAIChoice {
    #[serde(default)]
    pub message: Option<OpenAIReply>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct OpenAIReply {
    #[serde(default)]
    pub content: Option<String>,
}

impl OpenAIResponse {
    /// Pull the generated text out of the envelope.
    pub fn into_text(self) -> Result<String, DecodeError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or(DecodeError::EmptyChoices)?;
        let content = choice
            .message
            .and_then(|reply| reply.content)
            .ok_or(DecodeError::MissingContent)?;
        if content.trim().is_empty() {
            return Err(DecodeError::EmptyText);
        }
        Ok(content)
    }
}
