use reqwest::Client;
use serde_json::Value;

use crate::{
    config::{MANDI_API_KEY_VAR, MarketSettings},
    errors::AppError,
};

const DEFAULT_API_BASE: &str = "https://api.data.gov.in";
/// data.gov.in resource holding current daily mandi prices.
const DEFAULT_RESOURCE_ID: &str = "9ef84268-d588-465a-a308-a864a43d0070";
/// Stable public message; failure details go to the log only.
const FETCH_FAILED: &str = "Failed to fetch mandi data";

/// Mandi (wholesale market) price feed backed by data.gov.in.
///
/// Unlike the generation endpoints this feed has no degraded form: price data
/// is never fabricated, so failures surface as errors.
pub struct MarketFeed {
    config: MarketSettings,
    client: Client,
}

impl MarketFeed {
    pub fn new(config: MarketSettings, client: Client) -> Self {
        Self { config, client }
    }

    pub fn ensure_configured(&self) -> Result<(), AppError> {
        if self.config.api_key.trim().is_empty() {
            return Err(AppError::ConfigurationMissing(MANDI_API_KEY_VAR));
        }
        Ok(())
    }

    /// Latest mandi price records, passed through verbatim.
    pub async fn latest_prices(&self) -> Result<Value, AppError> {
        let base = self.config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
        let resource_id = self
            .config
            .resource_id
            .as_deref()
            .unwrap_or(DEFAULT_RESOURCE_ID);
        let url = format!("{}/resource/{}", base.trim_end_matches('/'), resource_id);
        let limit = self.config.limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api-key", self.config.api_key.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "mandi price request failed");
                AppError::upstream(None, FETCH_FAILED)
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(status, error = %error_body, "mandi price API returned an error");
            return Err(AppError::upstream(Some(status), FETCH_FAILED));
        }

        response.json::<Value>().await.map_err(|e| {
            tracing::error!(error = %e, "mandi price response was not valid JSON");
            AppError::upstream(None, FETCH_FAILED)
        })
    }
}
