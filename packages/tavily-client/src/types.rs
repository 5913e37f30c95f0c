//! Tavily API request and response types.

use serde::{Deserialize, Serialize};

// =============================================================================
// Search
// =============================================================================

/// Search depth. Advanced is required for per-source content chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    Advanced,
}

/// Search topic vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    General,
    News,
    Finance,
}

/// Time range filter for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Day,
    Week,
    Month,
    Year,
}

/// Search request parameters.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_depth: Option<SearchDepth>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,

    /// Restrict results to content from the last N days.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,

    /// Max content chunks per source. Only honored with advanced search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_per_source: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_domains: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_domains: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_answer: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_raw_content: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_images: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_image_descriptions: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_favicon: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_parameters: Option<bool>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            search_depth: None,
            topic: None,
            time_range: None,
            days: None,
            max_results: None,
            chunks_per_source: None,
            include_domains: None,
            exclude_domains: None,
            include_answer: None,
            include_raw_content: None,
            include_images: None,
            include_image_descriptions: None,
            include_favicon: None,
            country: None,
            auto_parameters: None,
        }
    }

    pub fn search_depth(mut self, depth: SearchDepth) -> Self {
        self.search_depth = Some(depth);
        self
    }

    pub fn topic(mut self, topic: Topic) -> Self {
        self.topic = Some(topic);
        self
    }

    pub fn time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    pub fn days(mut self, days: u32) -> Self {
        self.days = Some(days);
        self
    }

    pub fn max_results(mut self, max: u32) -> Self {
        self.max_results = Some(max);
        self
    }

    pub fn chunks_per_source(mut self, chunks: u32) -> Self {
        self.chunks_per_source = Some(chunks);
        self
    }

    pub fn include_domains(mut self, domains: Vec<String>) -> Self {
        self.include_domains = Some(domains);
        self
    }

    pub fn exclude_domains(mut self, domains: Vec<String>) -> Self {
        self.exclude_domains = Some(domains);
        self
    }

    pub fn include_answer(mut self, include: bool) -> Self {
        self.include_answer = Some(include);
        self
    }

    pub fn include_raw_content(mut self, include: bool) -> Self {
        self.include_raw_content = Some(include);
        self
    }

    pub fn include_images(mut self, include: bool) -> Self {
        self.include_images = Some(include);
        self
    }

    /// Replace the query while keeping every other parameter. Used when the
    /// same parameter set is fanned out across several queries.
    pub fn with_query(&self, query: impl Into<String>) -> Self {
        let mut req = self.clone();
        req.query = query.into();
        req
    }
}

/// A single search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

/// Image returned alongside search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Response from the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageResult>,
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub response_time: f64,
}

// =============================================================================
// Extract
// =============================================================================

/// Extraction depth. Advanced retrieves tables and embedded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractDepth {
    Basic,
    Advanced,
}

/// Extract request parameters.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractRequest {
    pub urls: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_depth: Option<ExtractDepth>,

    /// User intent used to rerank extracted chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_per_source: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_images: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_favicon: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ExtractRequest {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            extract_depth: None,
            query: None,
            chunks_per_source: None,
            include_images: None,
            include_favicon: None,
            format: None,
        }
    }

    pub fn extract_depth(mut self, depth: ExtractDepth) -> Self {
        self.extract_depth = Some(depth);
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn chunks_per_source(mut self, chunks: u32) -> Self {
        self.chunks_per_source = Some(chunks);
        self
    }

    pub fn include_images(mut self, include: bool) -> Self {
        self.include_images = Some(include);
        self
    }
}

/// Extracted content for a single URL.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractResult {
    pub url: String,
    #[serde(default)]
    pub raw_content: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A URL the extract endpoint could not process.
#[derive(Debug, Clone, Deserialize)]
pub struct FailedExtract {
    pub url: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response from the extract endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractResponse {
    #[serde(default)]
    pub results: Vec<ExtractResult>,
    #[serde(default)]
    pub failed_results: Vec<FailedExtract>,
    #[serde(default)]
    pub response_time: f64,
}

// =============================================================================
// Crawl and map
// =============================================================================

/// Crawl request parameters.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlRequest {
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_breadth: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub select_paths: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_paths: Option<Vec<String>>,

    /// Natural-language guidance for which pages to keep.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_per_source: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_depth: Option<ExtractDepth>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_external: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl CrawlRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_depth: None,
            max_breadth: None,
            limit: None,
            select_paths: None,
            exclude_paths: None,
            instructions: None,
            chunks_per_source: None,
            extract_depth: None,
            allow_external: None,
            format: None,
        }
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn max_breadth(mut self, breadth: u32) -> Self {
        self.max_breadth = Some(breadth);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn select_paths(mut self, paths: Vec<String>) -> Self {
        self.select_paths = Some(paths);
        self
    }

    pub fn exclude_paths(mut self, paths: Vec<String>) -> Self {
        self.exclude_paths = Some(paths);
        self
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// A single crawled page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlPage {
    pub url: String,
    #[serde(default)]
    pub raw_content: String,
}

/// Response from the crawl endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlResponse {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub results: Vec<CrawlPage>,
    #[serde(default)]
    pub response_time: f64,
}

/// Response from the map endpoint: discovered URLs only, no content.
#[derive(Debug, Clone, Deserialize)]
pub struct MapResponse {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(default)]
    pub response_time: f64,
}

// =============================================================================
// Research
// =============================================================================

/// Research model tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchModel {
    Mini,
    Pro,
    Auto,
}

/// Research request parameters.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchRequest {
    /// Free-text research topic or task description.
    pub input: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ResearchModel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// JSON schema the final report should fill out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_format: Option<String>,
}

impl ResearchRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            model: None,
            stream: None,
            output_schema: None,
            citation_format: None,
        }
    }

    pub fn model(mut self, model: ResearchModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn output_schema(mut self, schema: serde_json::Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn citation_format(mut self, format: impl Into<String>) -> Self {
        self.citation_format = Some(format.into());
        self
    }
}

/// Correlation handle returned when a research task is submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchHandle {
    pub request_id: String,
}

/// Lifecycle status of a research task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    /// Statuses this client does not know about are treated as in-progress.
    #[serde(other)]
    Unknown,
}

impl ResearchStatus {
    /// Polling stops at `completed` or `failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, ResearchStatus::Completed | ResearchStatus::Failed)
    }
}

/// A source citation attached to a research report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub citation: Option<String>,
}

/// Server-side state of a research task.
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchTask {
    #[serde(default)]
    pub request_id: String,
    pub status: ResearchStatus,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub response_time: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_request_skips_unset_fields() {
        let req = SearchRequest::new("rust async runtimes")
            .search_depth(SearchDepth::Advanced)
            .max_results(5);

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["query"], "rust async runtimes");
        assert_eq!(json["search_depth"], "advanced");
        assert_eq!(json["max_results"], 5);
        assert!(json.get("topic").is_none());
        assert!(json.get("include_domains").is_none());
    }

    #[test]
    fn research_status_terminal_states() {
        assert!(ResearchStatus::Completed.is_terminal());
        assert!(ResearchStatus::Failed.is_terminal());
        assert!(!ResearchStatus::Pending.is_terminal());
        assert!(!ResearchStatus::Processing.is_terminal());
        assert!(!ResearchStatus::Unknown.is_terminal());
    }

    #[test]
    fn unknown_status_deserializes() {
        let task: ResearchTask =
            serde_json::from_str(r#"{"request_id":"abc","status":"queued"}"#).unwrap();
        assert_eq!(task.status, ResearchStatus::Unknown);
        assert!(task.content.is_none());
        assert!(task.sources.is_empty());
    }

    #[test]
    fn map_response_deserializes_urls_only() {
        let json = r#"{
            "base_url": "https://docs.example.com",
            "results": [
                "https://docs.example.com/",
                "https://docs.example.com/guide"
            ],
            "response_time": 0.8
        }"#;
        let resp: MapResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.base_url, "https://docs.example.com");
        assert_eq!(resp.results.len(), 2);
        assert_eq!(resp.results[1], "https://docs.example.com/guide");

        // Sparse payloads still parse; every field defaults.
        let sparse: MapResponse = serde_json::from_str("{}").unwrap();
        assert!(sparse.results.is_empty());
    }

    #[test]
    fn with_query_keeps_parameters() {
        let base = SearchRequest::new("").max_results(7).include_answer(true);
        let req = base.with_query("rust web frameworks");
        assert_eq!(req.query, "rust web frameworks");
        assert_eq!(req.max_results, Some(7));
        assert_eq!(req.include_answer, Some(true));
    }
}
