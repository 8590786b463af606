use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::{OPENAI_API_KEY_VAR, ProviderSettings},
    errors::AppError,
    providers::{ChatProvider, GenerateRequest, openai::*},
};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI provider implementation
pub struct OpenAIProvider {
    config: ProviderSettings,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(config: ProviderSettings, client: Client) -> Self {
        Self { config, client }
    }

    fn model(&self) -> &str {
        self.config.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn endpoint(&self) -> String {
        let base = self.config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }

    /// Convert the neutral request to the chat completions format
    fn convert_request(&self, request: &GenerateRequest) -> OpenAIRequest {
        let mut messages = Vec::new();

        if let Some(system) = &request.system {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: OpenAIContent::Text(system.clone()),
            });
        }

        let content = match &request.image {
            Some(image) => OpenAIContent::Parts(vec![
                OpenAIContentPart::Text {
                    text: request.user_text.clone(),
                },
                OpenAIContentPart::ImageUrl {
                    image_url: OpenAIImageUrl {
                        url: format!("data:{};base64,{}", image.mime_type, image.data),
                    },
                },
            ]),
            None => OpenAIContent::Text(request.user_text.clone()),
        };
        messages.push(OpenAIMessage {
            role: "user".to_string(),
            content,
        });

        OpenAIRequest {
            model: self.model().to_string(),
            messages,
            response_format: request.json_output.then(OpenAIResponseFormat::json_object),
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn required_secret(&self) -> &'static str {
        OPENAI_API_KEY_VAR
    }

    fn is_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, AppError> {
        // Convert to OpenAI format
        let openai_req = self.convert_request(request);

        // Send request
        let response = self
            .client
            .post(self.endpoint())
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&openai_req)
            .send()
            .await
            .map_err(|e| {
                AppError::upstream(None, format!("Failed to send request to OpenAI: {}", e))
            })?;

        // Handle HTTP errors
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                Some(status),
                format!("OpenAI API error: {}", error_body),
            ));
        }

        // Parse response envelope
        let openai_res = response.json::<OpenAIResponse>().await.map_err(|e| {
            AppError::UpstreamDecode(format!("Failed to parse OpenAI response: {}", e))
        })?;

        Ok(openai_res.into_text()?)
    }
}
