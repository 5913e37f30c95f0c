//! Minimal xAI Live Search client.
//!
//! Covers the one flow this workspace needs: ask a Grok model a question with
//! X (Twitter) post search enabled, scoped to a set of handles and a date
//! range, and get back the answer plus post citations.
//!
//! # Example
//!
//! ```rust,ignore
//! use xai_client::XaiClient;
//!
//! let client = XaiClient::from_env()?;
//! let response = client
//!     .search_x_posts("What are these accounts discussing?", &["simonw".into()], 20, Some(100))
//!     .await?;
//! println!("{}", response.content);
//! ```

pub mod error;
pub mod types;

pub use error::{Result, XaiError};
pub use types::{LiveSearchRequest, LiveSearchResponse, Message, SearchParameters, SearchSource};

use chrono::{Duration, Utc};

const BASE_URL: &str = "https://api.x.ai/v1";
const DEFAULT_MODEL: &str = "grok-3";

pub struct XaiClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl XaiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from the `XAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("XAI_API_KEY")
            .map_err(|_| XaiError::Config("XAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Chat completion with Live Search.
    pub async fn live_search(&self, request: &LiveSearchRequest) -> Result<LiveSearchResponse> {
        let resp = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(XaiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let raw: types::ChatResponseRaw = resp
            .json()
            .await
            .map_err(|e| XaiError::Parse(e.to_string()))?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| XaiError::Parse("no choices in response".into()))?;

        Ok(LiveSearchResponse {
            content,
            citations: raw.citations,
        })
    }

    /// Search recent X posts from the given handles and answer `prompt`.
    ///
    /// `days_back` bounds the date range ending today; `min_favorites`
    /// filters low-engagement posts.
    pub async fn search_x_posts(
        &self,
        prompt: &str,
        handles: &[String],
        days_back: i64,
        min_favorites: Option<u32>,
    ) -> Result<LiveSearchResponse> {
        let to_date = Utc::now().date_naive();
        let from_date = to_date - Duration::days(days_back);

        tracing::info!(
            handles = handles.len(),
            %from_date,
            %to_date,
            "Searching X posts"
        );

        let request = LiveSearchRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            search_parameters: SearchParameters {
                mode: "on".to_string(),
                from_date: Some(from_date),
                to_date: Some(to_date),
                return_citations: true,
                sources: vec![SearchSource::X {
                    included_x_handles: handles.to_vec(),
                    post_favorite_count: min_favorites,
                }],
            },
        };

        self.live_search(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_source_serializes_with_type_tag() {
        let source = SearchSource::X {
            included_x_handles: vec!["simonw".into(), "karpathy".into()],
            post_favorite_count: Some(100),
        };
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["type"], "x");
        assert_eq!(json["included_x_handles"][1], "karpathy");
        assert_eq!(json["post_favorite_count"], 100);
    }

    #[test]
    fn client_builder() {
        let client = XaiClient::new("xai-test")
            .with_base_url("https://custom.api.com")
            .with_model("grok-4");
        assert_eq!(client.base_url, "https://custom.api.com");
        assert_eq!(client.model, "grok-4");
    }
}
