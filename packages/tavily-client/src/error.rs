//! Error types for the Tavily client.

use thiserror::Error;

/// Result type for Tavily client operations.
pub type Result<T> = std::result::Result<T, TavilyError>;

/// Tavily client errors.
#[derive(Debug, Error)]
pub enum TavilyError {
    /// Configuration error (missing API key, invalid parameters)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, request timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response)
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response shape)
    #[error("Parse error: {0}")]
    Parse(String),

    /// A research task reached `failed`; carries the server-supplied error verbatim.
    #[error("Research task failed: {0}")]
    TaskFailed(String),

    /// Polling exceeded the configured maximum wait.
    #[error("Research task timed out after {waited_secs}s")]
    Timeout { waited_secs: u64 },
}

impl From<reqwest::Error> for TavilyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TavilyError::Parse(err.to_string())
        } else {
            TavilyError::Network(err.to_string())
        }
    }
}
