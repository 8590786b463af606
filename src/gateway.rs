use std::sync::Arc;

use serde::Serialize;

use crate::errors::AppError;
use crate::normalize::{ChatAnswer, DiagnosisResult, EXPERT_UNAVAILABLE_MESSAGE, WeatherSummary};
use crate::prompts;
use crate::providers::ChatProvider;
use crate::validate::{PromptKind, PromptRequest};

/// Whether a dispatch used live model output or fell back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Degraded,
}

/// Normalized reply for a chat dispatch. Serializes flat, without a tag.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Reply {
    Answer(ChatAnswer),
    Diagnosis(DiagnosisResult),
}

/// Dispatch result. There is no error side: once a request passes the
/// configuration gate, upstream failure produces a degraded reply instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub reply: Reply,
    pub outcome: Outcome,
}

/// Routes validated prompts to the configured provider and shapes whatever
/// comes back into a reply the dashboard can always render.
pub struct AIGateway {
    provider: Arc<dyn ChatProvider>,
}

impl AIGateway {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Reject before dispatch when the provider's API key is missing. Runs
    /// before any network traffic.
    pub fn ensure_configured(&self) -> Result<(), AppError> {
        if !self.provider.is_configured() {
            return Err(AppError::ConfigurationMissing(
                self.provider.required_secret(),
            ));
        }
        Ok(())
    }

    /// Send a validated prompt upstream and normalize the result.
    pub async fn dispatch(&self, request: &PromptRequest) -> Dispatch {
        let generate = prompts::build(request);

        match self.provider.generate(&generate).await {
            Ok(text) => {
                tracing::info!(
                    provider = self.provider.name(),
                    kind = %request.kind,
                    "upstream call succeeded"
                );
                Dispatch {
                    reply: normalize_reply(&request.kind, &text),
                    outcome: Outcome::Succeeded,
                }
            }
            Err(err) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    kind = %request.kind,
                    error = %err,
                    "upstream call failed, serving degraded reply"
                );
                Dispatch {
                    reply: degraded_reply(&request.kind),
                    outcome: Outcome::Degraded,
                }
            }
        }
    }

    /// District weather for the dashboard. A missing key and an upstream
    /// failure both collapse to the static fallback; this path never errors.
    pub async fn district_weather(&self, city: &str) -> (WeatherSummary, Outcome) {
        if !self.provider.is_configured() {
            return (WeatherSummary::fallback(city), Outcome::Degraded);
        }

        let generate = prompts::weather_request(city);
        match self.provider.generate(&generate).await {
            Ok(text) => (
                WeatherSummary::from_model_text(city, &text),
                Outcome::Succeeded,
            ),
            Err(err) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    city,
                    error = %err,
                    "weather lookup failed, serving fallback"
                );
                (WeatherSummary::fallback(city), Outcome::Degraded)
            }
        }
    }
}

fn normalize_reply(kind: &PromptKind, text: &str) -> Reply {
    match kind {
        PromptKind::Diagnosis => Reply::Diagnosis(DiagnosisResult::from_model_text(text)),
        _ => Reply::Answer(ChatAnswer::new(text.trim())),
    }
}

fn degraded_reply(kind: &PromptKind) -> Reply {
    match kind {
        PromptKind::Diagnosis => Reply::Diagnosis(DiagnosisResult::unavailable()),
        PromptKind::DeepExpert { .. } => {
            Reply::Answer(ChatAnswer::new(EXPERT_UNAVAILABLE_MESSAGE))
        }
        _ => Reply::Answer(ChatAnswer::unavailable()),
    }
}
