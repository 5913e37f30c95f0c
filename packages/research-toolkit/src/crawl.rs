//! Site crawl followed by a single aggregate summary.

use std::time::Instant;

use async_trait::async_trait;
use llm_client::{invoke_with_fallback, ChatModel, Message, ModelConfig};
use serde::Serialize;
use tavily_client::{CrawlRequest, CrawlResponse, TavilyClient};

use crate::error::Result;
use crate::format::clean_raw_content;
use crate::usage::ToolUsage;

/// Keep the aggregate prompt from blowing past context limits.
const MAX_CONTENT_CHARS: usize = 120_000;

/// Crawl seam, mirrors [`crate::dedup::SearchApi`].
#[async_trait]
pub trait CrawlApi: Send + Sync {
    async fn crawl(&self, request: &CrawlRequest) -> tavily_client::Result<CrawlResponse>;
}

#[async_trait]
impl CrawlApi for TavilyClient {
    async fn crawl(&self, request: &CrawlRequest) -> tavily_client::Result<CrawlResponse> {
        self.crawl_with_retry(request, 1).await
    }
}

/// Output of [`crawl_and_summarize`].
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub base_url: String,
    pub summary: String,
    /// Which model produced the summary.
    pub model: String,
    /// URLs of every crawled page that contributed content.
    pub page_urls: Vec<String>,
    pub usage: ToolUsage,
}

/// Crawl a site and summarize everything found in one model invocation.
///
/// Page contents are cleaned, concatenated with per-page headers, and
/// truncated at [`MAX_CONTENT_CHARS`] before summarization. `instructions`
/// steer both the crawl and the summary when given.
pub async fn crawl_and_summarize(
    api: &impl CrawlApi,
    backend: &impl ChatModel,
    request: &CrawlRequest,
    model_config: &ModelConfig,
) -> Result<CrawlSummary> {
    let started = Instant::now();

    let response = api.crawl(request).await?;
    let mut usage = ToolUsage::default();
    usage.api.add_crawl(response.response_time);

    tracing::info!(
        url = %request.url,
        pages = response.results.len(),
        "Crawl complete, summarizing"
    );

    let mut combined = String::new();
    let mut page_urls = Vec::new();
    for page in &response.results {
        let cleaned = clean_raw_content(&page.raw_content);
        if cleaned.is_empty() {
            continue;
        }
        combined.push_str(&format!("\n\n--- PAGE: {} ---\n{}", page.url, cleaned));
        page_urls.push(page.url.clone());
        if combined.len() >= MAX_CONTENT_CHARS {
            tracing::debug!(pages_included = page_urls.len(), "Content cap reached");
            truncate_at_char_boundary(&mut combined, MAX_CONTENT_CHARS);
            break;
        }
    }

    let system = match &request.instructions {
        Some(instructions) => format!(
            "You are summarizing the pages of a crawled website. Follow these \
             instructions: {instructions}\n\nProduce one coherent summary \
             covering the material across all pages."
        ),
        None => "You are summarizing the pages of a crawled website. Produce one \
                 coherent summary covering the material across all pages."
            .to_string(),
    };
    let messages = vec![Message::system(system), Message::user(combined)];
    let summary = invoke_with_fallback(backend, model_config, &messages).await?;
    usage.llm.add_call(summary.usage.as_ref());
    usage.response_time = started.elapsed().as_secs_f64();

    Ok(CrawlSummary {
        base_url: response.base_url,
        summary: summary.content,
        model: summary.model,
        page_urls,
        usage,
    })
}

/// Cut `s` down to at most `max_bytes`, backing up to the nearest char
/// boundary so multi-byte characters are never split.
fn truncate_at_char_boundary(s: &mut String, max_bytes: usize) {
    if s.len() <= max_bytes {
        return;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}
