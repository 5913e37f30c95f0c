//! Pure Tavily REST API client.
//!
//! A minimal client for the Tavily platform: web search, page extraction,
//! site crawling, site mapping, and long-running research tasks with either
//! polling or SSE streaming.
//!
//! # Example
//!
//! ```rust,ignore
//! use tavily_client::{TavilyClient, SearchRequest, ResearchRequest, PollOptions};
//!
//! let client = TavilyClient::from_env()?;
//!
//! let response = client.search(&SearchRequest::new("rust async runtimes")).await?;
//! for result in &response.results {
//!     println!("{} ({})", result.title, result.url);
//! }
//!
//! let handle = client.research(&ResearchRequest::new("State of WebAssembly in 2026")).await?;
//! let report = client.wait_for_research(&handle.request_id, PollOptions::default()).await?;
//! println!("{}", report.content);
//! ```

pub mod error;
pub mod research;
pub mod streaming;
pub mod types;

pub use error::{Result, TavilyError};
pub use research::{poll_research, PollOptions, ResearchApi, ResearchReport};
pub use streaming::{ResearchEvent, ResearchStream};
pub use types::*;

use std::time::Duration;

const BASE_URL: &str = "https://api.tavily.com";

/// The extract endpoint rejects batches larger than this.
const MAX_EXTRACT_URLS: usize = 20;

/// Pure Tavily API client.
#[derive(Clone)]
pub struct TavilyClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TavilyClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Create from the `TAVILY_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("TAVILY_API_KEY")
            .map_err(|_| TavilyError::Config("TAVILY_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (proxies, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Web search.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        self.post("/search", request).await
    }

    /// Extract page content for up to 20 URLs.
    pub async fn extract(&self, request: &ExtractRequest) -> Result<ExtractResponse> {
        if request.urls.is_empty() {
            return Err(TavilyError::Config("extract requires at least one URL".into()));
        }
        if request.urls.len() > MAX_EXTRACT_URLS {
            return Err(TavilyError::Config(format!(
                "extract accepts at most {} URLs, got {}",
                MAX_EXTRACT_URLS,
                request.urls.len()
            )));
        }
        self.post("/extract", request).await
    }

    /// Crawl a site starting from a base URL.
    pub async fn crawl(&self, request: &CrawlRequest) -> Result<CrawlResponse> {
        self.post("/crawl", request).await
    }

    /// Map a site: discover URLs without fetching content.
    pub async fn map(&self, request: &CrawlRequest) -> Result<MapResponse> {
        self.post("/map", request).await
    }

    /// Submit a research task. Returns immediately with a correlation handle.
    pub async fn research(&self, request: &ResearchRequest) -> Result<ResearchHandle> {
        let handle: ResearchHandle = self.post("/research", request).await?;
        tracing::info!(request_id = %handle.request_id, "Research task submitted");
        Ok(handle)
    }

    /// Read the current state of a research task.
    pub async fn get_research(&self, request_id: &str) -> Result<ResearchTask> {
        let url = format!("{}/research/{}", self.base_url, request_id);
        let resp = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    /// Submit a research task and poll until it reaches a terminal status.
    pub async fn wait_for_research(
        &self,
        request_id: &str,
        options: PollOptions,
    ) -> Result<ResearchReport> {
        poll_research(self, request_id, options).await
    }

    /// Submit a streaming research task and consume it as SSE events.
    pub async fn research_stream(&self, request: &ResearchRequest) -> Result<ResearchStream> {
        let mut request = request.clone();
        request.stream = Some(true);

        let resp = self
            .http_client
            .post(format!("{}/research", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Research stream request rejected");
            return Err(TavilyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(ResearchStream::new(resp.bytes_stream()))
    }

    /// Search with bounded retry and exponential backoff.
    pub async fn search_with_retry(
        &self,
        request: &SearchRequest,
        max_retries: u32,
    ) -> Result<SearchResponse> {
        retry(max_retries, || self.search(request)).await
    }

    /// Extract with bounded retry and exponential backoff.
    pub async fn extract_with_retry(
        &self,
        request: &ExtractRequest,
        max_retries: u32,
    ) -> Result<ExtractResponse> {
        retry(max_retries, || self.extract(request)).await
    }

    /// Crawl with bounded retry and exponential backoff.
    pub async fn crawl_with_retry(
        &self,
        request: &CrawlRequest,
        max_retries: u32,
    ) -> Result<CrawlResponse> {
        retry(max_retries, || self.crawl(request)).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let resp = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TavilyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        resp.json()
            .await
            .map_err(|e| TavilyError::Parse(e.to_string()))
    }
}

/// Run an async operation with up to `max_retries` additional attempts,
/// sleeping 2^n seconds between attempts. Configuration errors are not
/// retried; they will not resolve on their own.
async fn retry<T, F, Fut>(max_retries: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(TavilyError::Config(msg)) => return Err(TavilyError::Config(msg)),
            Err(err) => {
                if attempt >= max_retries {
                    return Err(err);
                }
                let backoff = Duration::from_secs(1 << attempt);
                tracing::debug!(attempt, error = %err, backoff_secs = backoff.as_secs(), "Retrying Tavily request");
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}
