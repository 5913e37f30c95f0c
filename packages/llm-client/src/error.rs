//! Error types for the LLM client.

use thiserror::Error;

/// Result type for LLM client operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// One failed model attempt inside a fallback cascade.
#[derive(Debug, Clone)]
pub struct ModelAttempt {
    pub model: String,
    pub error: String,
}

/// LLM client errors.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Configuration error (missing API key, empty model list)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Provider error (non-2xx response, rate limit)
    #[error("API error: {0}")]
    Api(String),

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Every configured model failed. Carries each attempt in order.
    #[error("all models failed: {}", format_attempts(attempts))]
    Exhausted { attempts: Vec<ModelAttempt> },
}

fn format_attempts(attempts: &[ModelAttempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.model, a.error))
        .collect::<Vec<_>>()
        .join("; ")
}
