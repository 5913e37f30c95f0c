//! Error types for the xAI client.

use thiserror::Error;

/// Result type for xAI client operations.
pub type Result<T> = std::result::Result<T, XaiError>;

/// xAI client errors.
#[derive(Debug, Error)]
pub enum XaiError {
    /// Configuration error (missing API key)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response)
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for XaiError {
    fn from(err: reqwest::Error) -> Self {
        XaiError::Network(err.to_string())
    }
}
