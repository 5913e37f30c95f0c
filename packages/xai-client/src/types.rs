//! xAI Live Search request and response types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Chat message.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Live Search parameters attached to a chat completion.
#[derive(Debug, Clone, Serialize)]
pub struct SearchParameters {
    /// "on", "off", or "auto".
    pub mode: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,

    pub return_citations: bool,

    pub sources: Vec<SearchSource>,
}

/// A single Live Search source. Only the X source is modeled here.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchSource {
    X {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        included_x_handles: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        post_favorite_count: Option<u32>,
    },
}

/// Chat completion request with Live Search enabled.
#[derive(Debug, Clone, Serialize)]
pub struct LiveSearchRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub search_parameters: SearchParameters,
}

/// Response from a Live Search chat completion.
#[derive(Debug, Clone)]
pub struct LiveSearchResponse {
    pub content: String,
    /// Post URLs the answer cites, in server order.
    pub citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseRaw {
    pub choices: Vec<ChoiceRaw>,
    #[serde(default)]
    pub citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceRaw {
    pub message: MessageRaw,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageRaw {
    #[serde(default)]
    pub content: String,
}
