use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    config::{NEWS_API_KEY_VAR, NewsSettings},
    errors::AppError,
};

const DEFAULT_API_BASE: &str = "https://newsapi.org/v2";
const HEADLINE_SEPARATOR: &str = " • ";

/// Ticker payload returned to the dashboard.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewsTicker {
    pub category: String,
    pub text: String,
}

#[derive(Deserialize, Debug, Default)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

#[derive(Deserialize, Debug, Default)]
struct NewsArticle {
    #[serde(default)]
    title: Option<String>,
}

/// Headline feed backed by newsapi.org.
pub struct NewsFeed {
    config: NewsSettings,
    client: Client,
}

impl NewsFeed {
    pub fn new(config: NewsSettings, client: Client) -> Self {
        Self { config, client }
    }

    pub fn ensure_configured(&self) -> Result<(), AppError> {
        if self.config.api_key.trim().is_empty() {
            return Err(AppError::ConfigurationMissing(NEWS_API_KEY_VAR));
        }
        Ok(())
    }

    fn search_query(category: &str) -> &'static str {
        match category {
            "kashmir" => "Jammu and Kashmir agriculture",
            "sports" => "cricket India",
            _ => "agriculture India",
        }
    }

    /// Fetch the latest headlines for a category, joined into one ticker line.
    /// An empty string means the feed had no usable titles.
    pub async fn ticker(&self, category: &str) -> Result<String, AppError> {
        let base = self.config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
        let url = format!("{}/everything", base.trim_end_matches('/'));
        let page_size = self.config.page_size.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", Self::search_query(category)),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
                ("apiKey", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::upstream(None, format!("Failed to reach news API: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                Some(status),
                format!("News API error: {}", error_body),
            ));
        }

        let envelope = response.json::<NewsApiResponse>().await.map_err(|e| {
            AppError::UpstreamDecode(format!("Failed to parse news response: {}", e))
        })?;

        let titles: Vec<String> = envelope
            .articles
            .into_iter()
            .filter_map(|article| article.title)
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .collect();

        Ok(titles.join(HEADLINE_SEPARATOR))
    }
}
