//! Fallback model cascade.
//!
//! Tries a primary model and, on failure, each configured fallback in order,
//! one attempt each, stopping at the first success. With no fallbacks the
//! primary gets one retry (two attempts total). The successful response is
//! tagged with the model that produced it; exhaustion aggregates every
//! attempted (model, error) pair in order.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{LlmError, ModelAttempt, Result};
use crate::schema::StructuredOutput;
use crate::types::{ChatRequest, ChatResponse, Message, Usage};

/// Seam for chat-completion backends, mockable in tests.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// Primary model plus an ordered fallback chain, static per call.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model: String,
    pub fallback_models: Vec<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Base delay between the two primary attempts (doubles per retry).
    pub retry_backoff: Duration,
}

impl ModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            fallback_models: Vec::new(),
            temperature: None,
            max_tokens: None,
            retry_backoff: Duration::from_secs(1),
        }
    }

    /// Append a fallback model. Order of calls is attempt order.
    pub fn fallback(mut self, model: impl Into<String>) -> Self {
        self.fallback_models.push(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Primary followed by fallbacks.
    pub fn all_models(&self) -> Vec<&str> {
        std::iter::once(self.model.as_str())
            .chain(self.fallback_models.iter().map(String::as_str))
            .collect()
    }

    fn request_for(&self, model: &str, messages: &[Message]) -> ChatRequest {
        let mut request = ChatRequest::new(model, messages.to_vec());
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        request
    }
}

/// A response attributed to the model that produced it.
#[derive(Debug, Clone)]
pub struct FallbackResponse {
    pub content: String,
    /// Which model in the cascade answered.
    pub model: String,
    pub usage: Option<Usage>,
}

/// Typed structured-output response from the cascade.
#[derive(Debug)]
pub struct StructuredResponse<T> {
    pub value: T,
    pub model: String,
    pub usage: Option<Usage>,
}

/// Invoke with the fallback cascade; plain text completion.
pub async fn invoke_with_fallback<M: ChatModel>(
    backend: &M,
    config: &ModelConfig,
    messages: &[Message],
) -> Result<FallbackResponse> {
    run_cascade(config, |model| {
        let request = config.request_for(&model, messages);
        async move { backend.complete(&request).await.map(|r| (model, r)) }
    })
    .await
}

/// Invoke with the fallback cascade; structured output deserialized into `T`.
pub async fn invoke_structured_with_fallback<T, M>(
    backend: &M,
    config: &ModelConfig,
    messages: &[Message],
) -> Result<StructuredResponse<T>>
where
    T: StructuredOutput,
    M: ChatModel,
{
    let schema = T::response_schema();
    let response = run_cascade(config, |model| {
        let request = config
            .request_for(&model, messages)
            .response_schema(schema.clone());
        async move { backend.complete(&request).await.map(|r| (model, r)) }
    })
    .await?;

    let value: T = serde_json::from_str(&response.content)
        .map_err(|e| LlmError::Parse(format!("failed to deserialize structured output: {}", e)))?;

    Ok(StructuredResponse {
        value,
        model: response.model,
        usage: response.usage,
    })
}

/// Evaluate one attempt closure per cascade slot, left to right, early exit
/// on first success.
async fn run_cascade<F, Fut>(config: &ModelConfig, mut attempt: F) -> Result<FallbackResponse>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<(String, ChatResponse)>>,
{
    let models = config.all_models();
    let has_fallbacks = models.len() > 1;
    // Each model gets one attempt when fallbacks exist; a lone primary gets two.
    let attempts_per_model: u32 = if has_fallbacks { 1 } else { 2 };

    let mut attempts: Vec<ModelAttempt> = Vec::new();

    for model in models {
        for try_index in 0..attempts_per_model {
            match attempt(model.to_string()).await {
                Ok((model, response)) => {
                    tracing::debug!(model = %model, attempts = attempts.len() + 1, "Model call succeeded");
                    return Ok(FallbackResponse {
                        content: response.content,
                        model,
                        usage: response.usage,
                    });
                }
                Err(err) => {
                    tracing::warn!(model, error = %err, "Model call failed");
                    attempts.push(ModelAttempt {
                        model: model.to_string(),
                        error: err.to_string(),
                    });
                    if try_index + 1 < attempts_per_model && !config.retry_backoff.is_zero() {
                        tokio::time::sleep(config.retry_backoff * (1 << try_index)).await;
                    }
                }
            }
        }
    }

    Err(LlmError::Exhausted { attempts })
}
