use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::{GEMINI_API_KEY_VAR, ProviderSettings},
    errors::AppError,
    providers::{ChatProvider, GenerateRequest, gemini::*},
};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Google Gemini provider implementation
pub struct GeminiProvider {
    config: ProviderSettings,
    client: Client,
}

impl GeminiProvider {
    /// 创建新的Gemini提供商实例
    ///
    /// ## 功能说明
    /// 使用给定的配置和HTTP客户端创建Google Gemini提供商实例
    ///
    /// ## 参数说明
    /// - `config`: Gemini提供商的配置，api_key可以为空（请求时才检查）
    /// - `client`: 共享的HTTP客户端，用于发送API请求
    ///
    /// ## 执行例子
    /// ```rust
    /// use kisan_gateway::config::ProviderSettings;
    /// use kisan_gateway::providers::GeminiProvider;
    /// use reqwest::Client;
    ///
    /// let config = ProviderSettings {
    ///     api_key: "AIza-test".to_string(),
    ///     ..ProviderSettings::default()
    /// };
    /// let provider = GeminiProvider::new(config, Client::new());
    /// ```
    pub fn new(config: ProviderSettings, client: Client) -> Self {
        Self { config, client }
    }

    fn model(&self) -> &str {
        self.config.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn endpoint(&self) -> String {
        let base = self.config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
        format!("{}/{}:generateContent", base.trim_end_matches('/'), self.model())
    }

    /// Convert the neutral request to the generateContent format
    fn convert_request(&self, request: &GenerateRequest) -> GeminiRequest {
        let mut parts = Vec::new();

        // Image first, instruction text after, matching how the model is prompted
        if let Some(image) = &request.image {
            parts.push(GeminiPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
            });
        }
        parts.push(GeminiPart::Text {
            text: request.user_text.clone(),
        });

        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts,
            }],
            system_instruction: request.system.as_ref().map(|text| GeminiSystemInstruction {
                parts: vec![GeminiPart::Text { text: text.clone() }],
            }),
            generation_config: request.json_output.then(|| GeminiGenerationConfig {
                response_mime_type: Some("application/json".to_string()),
            }),
        }
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn required_secret(&self) -> &'static str {
        GEMINI_API_KEY_VAR
    }

    fn is_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, AppError> {
        // Convert to Gemini format
        let gemini_req = self.convert_request(request);

        // Send request; this API takes the key as a query parameter
        let response = self
            .client
            .post(self.endpoint())
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .query(&[("key", self.config.api_key.as_str())])
            .json(&gemini_req)
            .send()
            .await
            .map_err(|e| {
                AppError::upstream(None, format!("Failed to send request to Gemini: {}", e))
            })?;

        // Handle HTTP errors
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                Some(status),
                format!("Gemini API error: {}", error_body),
            ));
        }

        // Parse response envelope
        let gemini_res = response.json::<GeminiResponse>().await.map_err(|e| {
            AppError::UpstreamDecode(format!("Failed to parse Gemini response: {}", e))
        })?;

        Ok(gemini_res.into_text()?)
    }
}
