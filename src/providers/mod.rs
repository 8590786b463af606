pub mod gemini;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::{config::Config, errors::AppError};

// Re-export the concrete providers for easier access
pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;

/// Inline image attached to a generation request, already stripped of any
/// data-URL prefix by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

/// Provider-neutral generation request.
///
/// Prompt construction happens before this point; a provider only decides how
/// to lay these fields out in its own wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub system: Option<String>,
    pub user_text: String,
    pub image: Option<InlineImage>,
    /// Ask the provider to reply with a single JSON object.
    pub json_output: bool,
}

/// Core provider trait that all upstream AI services implement
///
/// This trait defines the standard interface for all providers, ensuring
/// consistent behavior across different AI services.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Short identifier used in logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Environment variable holding this provider's API key.
    fn required_secret(&self) -> &'static str;

    /// True once the API key is present. Checked before any dispatch so that
    /// a missing secret never turns into an upstream call.
    fn is_configured(&self) -> bool;

    /// Send one generation request and return the raw model text.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, AppError>;
}

/// Build the provider selected in configuration.
///
/// The choice is fixed per deployment; an unknown name is a configuration
/// error, not a request error.
pub fn build_provider(config: &Config, client: Client) -> Result<Arc<dyn ChatProvider>, AppError> {
    match config.chat.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIProvider::new(
            config.providers.openai.clone(),
            client,
        ))),
        "gemini" => Ok(Arc::new(GeminiProvider::new(
            config.providers.gemini.clone(),
            client,
        ))),
        other => Err(AppError::ConfigError(format!(
            "Unknown chat provider '{other}'"
        ))),
    }
}
