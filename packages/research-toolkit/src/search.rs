//! Search with relevance filtering and prompt-ready formatting.

use std::time::Instant;

use serde::Serialize;
use tavily_client::{SearchRequest, SearchResult};

use crate::dedup::{search_dedup, DedupedSearch, QueryFailure, SearchApi};
use crate::error::{Result, ToolkitError};
use crate::format::{clean_formatted_output, format_web_results};
use crate::usage::ApiUsage;

/// Results below this score are noise more often than signal.
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.3;
/// Cap on results fed into a prompt.
pub const MAX_FORMATTED_RESULTS: usize = 20;

/// Search output with a formatted string ready for prompt context.
#[derive(Debug, Clone, Serialize)]
pub struct FormattedSearch {
    /// Prompt-ready source blocks, cleaned.
    pub formatted: String,
    /// The results that survived the score filter, sorted by score.
    pub results: Vec<SearchResult>,
    pub answer: Option<String>,
    pub failures: Vec<QueryFailure>,
    pub usage: ApiUsage,
    pub response_time: f64,
}

/// Search one or more queries and format the merged results.
///
/// A single query goes straight to the API; multiple queries fan out through
/// [`search_dedup`]. Results under `threshold` are dropped, the rest are
/// capped at [`MAX_FORMATTED_RESULTS`] by score.
pub async fn search_and_format(
    api: &impl SearchApi,
    queries: &[String],
    params: &SearchRequest,
    threshold: Option<f64>,
) -> Result<FormattedSearch> {
    if queries.is_empty() {
        return Err(ToolkitError::Input("At least one query is required".into()));
    }
    let threshold = threshold.unwrap_or(DEFAULT_SCORE_THRESHOLD);
    let started = Instant::now();

    let merged = if queries.len() == 1 {
        let response = api.search(&params.with_query(queries[0].clone())).await?;
        let mut usage = ApiUsage::default();
        usage.add_search(response.response_time);
        let mut single = crate::dedup::merge_responses(vec![response]);
        single.queries = queries.to_vec();
        single.usage = usage;
        single
    } else {
        search_dedup(api, queries, params).await?
    };

    Ok(filter_and_format(merged, threshold, started))
}

fn filter_and_format(merged: DedupedSearch, threshold: f64, started: Instant) -> FormattedSearch {
    let total = merged.results.len();
    // merge_responses sorts by score descending, so truncation keeps the best.
    let mut results: Vec<SearchResult> = merged
        .results
        .into_iter()
        .filter(|r| r.score >= threshold)
        .collect();
    results.truncate(MAX_FORMATTED_RESULTS);

    tracing::debug!(
        total,
        kept = results.len(),
        threshold,
        "Filtered search results"
    );

    let formatted = clean_formatted_output(&format_web_results(&results));

    FormattedSearch {
        formatted,
        results,
        answer: merged.answer,
        failures: merged.failures,
        usage: merged.usage,
        response_time: started.elapsed().as_secs_f64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tavily_client::SearchResponse;

    struct StubApi {
        calls: AtomicUsize,
        results_per_call: Vec<SearchResult>,
    }

    #[async_trait]
    impl SearchApi for StubApi {
        async fn search(&self, _request: &SearchRequest) -> tavily_client::Result<SearchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SearchResponse {
                query: "q".into(),
                answer: None,
                results: self.results_per_call.clone(),
                images: Vec::new(),
                response_time: 0.1,
            })
        }
    }

    fn result(url: &str, score: f64) -> SearchResult {
        SearchResult {
            url: url.into(),
            title: format!("Title {url}"),
            content: "some content".into(),
            score,
            raw_content: None,
            published_date: None,
            favicon: None,
        }
    }

    #[tokio::test]
    async fn single_query_issues_one_search() {
        let api = StubApi {
            calls: AtomicUsize::new(0),
            results_per_call: vec![result("https://a.com", 0.9)],
        };
        let out = search_and_format(&api, &["only".into()], &SearchRequest::new(""), None)
            .await
            .unwrap();
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(out.results.len(), 1);
        assert!(out.formatted.contains("SOURCE 1"));
    }

    #[tokio::test]
    async fn low_scores_are_filtered_out() {
        let api = StubApi {
            calls: AtomicUsize::new(0),
            results_per_call: vec![
                result("https://keep.com", 0.8),
                result("https://drop.com", 0.1),
            ],
        };
        let out = search_and_format(&api, &["q".into()], &SearchRequest::new(""), None)
            .await
            .unwrap();
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.results[0].url, "https://keep.com");
        assert!(!out.formatted.contains("drop.com"));
    }

    #[tokio::test]
    async fn results_are_capped() {
        let many: Vec<SearchResult> = (0..30)
            .map(|i| result(&format!("https://site{i}.com"), 0.9 - i as f64 * 0.01))
            .collect();
        let api = StubApi {
            calls: AtomicUsize::new(0),
            results_per_call: many,
        };
        let out = search_and_format(&api, &["q".into()], &SearchRequest::new(""), None)
            .await
            .unwrap();
        assert_eq!(out.results.len(), MAX_FORMATTED_RESULTS);
        assert_eq!(out.results[0].url, "https://site0.com");
    }

    #[tokio::test]
    async fn empty_query_list_is_rejected() {
        let api = StubApi {
            calls: AtomicUsize::new(0),
            results_per_call: Vec::new(),
        };
        let err = search_and_format(&api, &[], &SearchRequest::new(""), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolkitError::Input(_)));
    }
}
