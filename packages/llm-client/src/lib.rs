//! OpenAI-compatible chat client with a fallback model cascade.
//!
//! The client itself is a thin REST wrapper; the interesting part is
//! [`invoke_with_fallback`], which tries a primary model and an ordered list
//! of fallbacks and tags the response with the model that produced it.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm_client::{invoke_with_fallback, Message, ModelConfig, OpenAiClient};
//!
//! let client = OpenAiClient::from_env()?;
//! let config = ModelConfig::new("gpt-5")
//!     .fallback("gpt-5-mini")
//!     .fallback("gpt-4o");
//!
//! let response = invoke_with_fallback(&client, &config, &[Message::user("Hello!")]).await?;
//! println!("[{}] {}", response.model, response.content);
//! ```

pub mod error;
pub mod fallback;
pub mod schema;
pub mod types;

pub use error::{LlmError, ModelAttempt, Result};
pub use fallback::{
    invoke_structured_with_fallback, invoke_with_fallback, ChatModel, FallbackResponse,
    ModelConfig, StructuredResponse,
};
pub use schema::StructuredOutput;
pub use types::{ChatRequest, ChatResponse, Message, Usage};

use async_trait::async_trait;
use tracing::{debug, warn};

/// OpenAI-compatible REST client.
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| LlmError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (Azure, proxies, other compatible vendors).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Chat completion.
    pub async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Chat completion request failed");
                LlmError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Provider returned an error");
            return Err(LlmError::Api(error_text));
        }

        let raw: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::Api("no choices in response".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "Chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: raw.usage,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.chat_completion(request).await
    }
}
