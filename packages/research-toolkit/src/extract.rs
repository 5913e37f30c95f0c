//! Page extraction followed by per-page LLM summarization.

use std::time::Instant;

use async_trait::async_trait;
use futures::future::join_all;
use llm_client::{invoke_with_fallback, ChatModel, Message, ModelConfig};
use serde::Serialize;
use tavily_client::{ExtractRequest, ExtractResponse, TavilyClient};

use crate::error::{Result, ToolkitError};
use crate::format::clean_raw_content;
use crate::usage::{LlmUsage, ToolUsage};

/// Extraction seam, mirrors [`crate::dedup::SearchApi`].
#[async_trait]
pub trait ExtractApi: Send + Sync {
    async fn extract(&self, request: &ExtractRequest) -> tavily_client::Result<ExtractResponse>;
}

#[async_trait]
impl ExtractApi for TavilyClient {
    async fn extract(&self, request: &ExtractRequest) -> tavily_client::Result<ExtractResponse> {
        self.extract_with_retry(request, 1).await
    }
}

/// One extracted and summarized page.
#[derive(Debug, Clone, Serialize)]
pub struct PageSummary {
    pub url: String,
    pub summary: String,
    /// Which model produced the summary.
    pub model: String,
}

/// Output of [`extract_and_summarize`].
#[derive(Debug, Clone, Serialize)]
pub struct ExtractSummary {
    pub pages: Vec<PageSummary>,
    /// URLs the extract endpoint rejected, with the reported reason.
    pub failed_urls: Vec<(String, String)>,
    pub usage: ToolUsage,
}

fn summary_prompt(query: Option<&str>) -> String {
    match query {
        Some(query) => format!(
            "You are summarizing a webpage for a researcher. Focus on information \
             relevant to this question: {query}\n\nSummarize the key facts, figures, \
             and claims. Be concise and concrete."
        ),
        None => "You are summarizing a webpage for a researcher. Summarize the key \
                 facts, figures, and claims. Be concise and concrete."
            .to_string(),
    }
}

/// Extract each URL and summarize its content with the model cascade.
///
/// Pages the extract endpoint fails on are reported, not fatal. Summaries run
/// concurrently, one model invocation per page; `query` focuses them when
/// given.
pub async fn extract_and_summarize(
    api: &impl ExtractApi,
    backend: &impl ChatModel,
    urls: Vec<String>,
    model_config: &ModelConfig,
    query: Option<&str>,
) -> Result<ExtractSummary> {
    if urls.is_empty() {
        return Err(ToolkitError::Input("At least one URL is required".into()));
    }
    let started = Instant::now();

    let response = api.extract(&ExtractRequest::new(urls)).await?;
    let mut usage = ToolUsage::default();
    usage.api.add_extract(response.response_time);

    let failed_urls: Vec<(String, String)> = response
        .failed_results
        .iter()
        .map(|f| {
            (
                f.url.clone(),
                f.error.clone().unwrap_or_else(|| "extraction failed".into()),
            )
        })
        .collect();
    for (url, error) in &failed_urls {
        tracing::warn!(url = %url, error = %error, "Extraction failed for URL");
    }

    let system = summary_prompt(query);
    let summaries = response.results.iter().map(|page| {
        let content = clean_raw_content(&page.raw_content);
        let messages = vec![Message::system(&system), Message::user(&content)];
        async move {
            let result = invoke_with_fallback(backend, model_config, &messages).await;
            (page.url.clone(), result)
        }
    });
    let outcomes = join_all(summaries).await;

    let mut pages = Vec::new();
    let mut llm = LlmUsage::default();
    let mut failed_urls = failed_urls;
    for (url, outcome) in outcomes {
        match outcome {
            Ok(response) => {
                llm.add_call(response.usage.as_ref());
                pages.push(PageSummary {
                    url,
                    summary: response.content,
                    model: response.model,
                });
            }
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "Summarization failed for URL");
                failed_urls.push((url, err.to_string()));
            }
        }
    }
    usage.llm = llm;
    usage.response_time = started.elapsed().as_secs_f64();

    Ok(ExtractSummary {
        pages,
        failed_urls,
        usage,
    })
}
