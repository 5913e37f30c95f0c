//! Error types for the research toolkit.

use thiserror::Error;

/// Result type for toolkit operations.
pub type Result<T> = std::result::Result<T, ToolkitError>;

/// Research toolkit errors.
#[derive(Debug, Error)]
pub enum ToolkitError {
    #[error(transparent)]
    Tavily(#[from] tavily_client::TavilyError),

    #[error(transparent)]
    Llm(#[from] llm_client::LlmError),

    /// Invalid input to a tool (empty query list, bad platform name)
    #[error("Invalid input: {0}")]
    Input(String),
}
