//! Parallel multi-query search with URL-keyed deduplication.
//!
//! Several queries run concurrently; results sharing a URL are merged into a
//! single entry. The first occurrence wins title and metadata, the higher
//! score is kept, and content chunks (separated by ` [...] `) are unioned
//! with duplicates dropped. One query failing does not abort its siblings;
//! its error is retained alongside the partial results.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tavily_client::{SearchRequest, SearchResponse, SearchResult, TavilyClient};

use crate::error::Result;
use crate::usage::ApiUsage;

/// Separator the search API uses between content chunks of one source.
pub const CHUNK_SEPARATOR: &str = " [...] ";

/// Search seam so the merge pipeline is testable without a live API.
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> tavily_client::Result<SearchResponse>;
}

#[async_trait]
impl SearchApi for TavilyClient {
    async fn search(&self, request: &SearchRequest) -> tavily_client::Result<SearchResponse> {
        // One retry with backoff; transient search errors are common enough.
        self.search_with_retry(request, 1).await
    }
}

/// A query whose search call failed after retries.
#[derive(Debug, Clone, Serialize)]
pub struct QueryFailure {
    pub query: String,
    pub error: String,
}

/// Merged output of a multi-query search.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DedupedSearch {
    /// One entry per distinct URL, sorted by score for display.
    pub results: Vec<SearchResult>,
    /// Per-query answers joined with blank lines, when requested.
    pub answer: Option<String>,
    /// Deduplicated image results.
    pub images: Vec<tavily_client::ImageResult>,
    /// The queries that produced results, in submission order.
    pub queries: Vec<String>,
    /// Queries that failed; siblings' results are still present.
    pub failures: Vec<QueryFailure>,
    pub usage: ApiUsage,
    /// Wall-clock time for the whole fan-out, seconds.
    pub response_time: f64,
}

/// Run every query concurrently and merge the responses by URL.
pub async fn search_dedup(
    api: &impl SearchApi,
    queries: &[String],
    params: &SearchRequest,
) -> Result<DedupedSearch> {
    let started = Instant::now();

    let searches = queries.iter().map(|query| {
        let request = params.with_query(query.clone());
        async move { (query.clone(), api.search(&request).await) }
    });
    let outcomes = join_all(searches).await;

    let mut responses = Vec::new();
    let mut failures = Vec::new();
    let mut usage = ApiUsage::default();
    let mut succeeded_queries = Vec::new();

    for (query, outcome) in outcomes {
        match outcome {
            Ok(response) => {
                usage.add_search(response.response_time);
                succeeded_queries.push(query);
                responses.push(response);
            }
            Err(err) => {
                tracing::warn!(query = %query, error = %err, "Search query failed; keeping siblings");
                failures.push(QueryFailure {
                    query,
                    error: err.to_string(),
                });
            }
        }
    }

    let mut merged = merge_responses(responses);
    merged.queries = succeeded_queries;
    merged.failures = failures;
    merged.usage = usage;
    merged.response_time = started.elapsed().as_secs_f64();

    tracing::info!(
        queries = queries.len(),
        results = merged.results.len(),
        failed = merged.failures.len(),
        "Deduplicated search complete"
    );

    Ok(merged)
}

/// Merge responses by URL. Pure; ordering of the input is submission order.
pub fn merge_responses(responses: Vec<SearchResponse>) -> DedupedSearch {
    // Per URL: the first-seen result plus its chunk union in first-seen order.
    let mut url_order: Vec<String> = Vec::new();
    let mut url_data: HashMap<String, (SearchResult, Vec<String>, HashSet<String>)> =
        HashMap::new();

    let mut seen_image_urls: HashSet<String> = HashSet::new();
    let mut images = Vec::new();
    let mut answers: Vec<String> = Vec::new();

    for response in responses {
        for image in response.images {
            if seen_image_urls.insert(image.url.clone()) {
                images.push(image);
            }
        }

        if let Some(answer) = response.answer {
            if !answer.is_empty() {
                answers.push(answer);
            }
        }

        for result in response.results {
            if result.url.is_empty() {
                continue;
            }
            let chunks = split_chunks(&result.content);

            match url_data.get_mut(&result.url) {
                Some((existing, chunk_order, chunk_set)) => {
                    for chunk in chunks {
                        if chunk_set.insert(chunk.clone()) {
                            chunk_order.push(chunk);
                        }
                    }
                    if result.score > existing.score {
                        existing.score = result.score;
                    }
                }
                None => {
                    let mut chunk_set = HashSet::new();
                    let mut chunk_order = Vec::new();
                    for chunk in chunks {
                        if chunk_set.insert(chunk.clone()) {
                            chunk_order.push(chunk);
                        }
                    }
                    url_order.push(result.url.clone());
                    url_data.insert(result.url.clone(), (result, chunk_order, chunk_set));
                }
            }
        }
    }

    let mut results: Vec<SearchResult> = url_order
        .into_iter()
        .filter_map(|url| url_data.remove(&url))
        .map(|(mut result, chunk_order, _)| {
            result.content = chunk_order.join(CHUNK_SEPARATOR);
            result
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    DedupedSearch {
        results,
        answer: if answers.is_empty() {
            None
        } else {
            Some(answers.join("\n\n"))
        },
        images,
        ..Default::default()
    }
}

fn split_chunks(content: &str) -> Vec<String> {
    content
        .split(CHUNK_SEPARATOR)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tavily_client::TavilyError;

    fn result(url: &str, title: &str, content: &str, score: f64) -> SearchResult {
        SearchResult {
            url: url.into(),
            title: title.into(),
            content: content.into(),
            score,
            raw_content: None,
            published_date: None,
            favicon: None,
        }
    }

    fn response(results: Vec<SearchResult>) -> SearchResponse {
        SearchResponse {
            query: String::new(),
            answer: None,
            images: Vec::new(),
            results,
            response_time: 1.0,
        }
    }

    #[test]
    fn single_response_passes_through() {
        let merged = merge_responses(vec![response(vec![result(
            "https://example.com/messi",
            "Messi Bio",
            "Messi is a footballer",
            0.9,
        )])]);

        assert_eq!(merged.results.len(), 1);
        assert_eq!(merged.results[0].url, "https://example.com/messi");
        assert_eq!(merged.results[0].content, "Messi is a footballer");
    }

    #[test]
    fn overlapping_urls_merge_to_chunk_union() {
        let merged = merge_responses(vec![
            response(vec![
                result("https://a.com", "A", "alpha [...] beta", 0.8),
                result("https://b.com", "B", "only-b", 0.5),
            ]),
            response(vec![result(
                "https://a.com",
                "A (dup)",
                "beta [...] gamma",
                0.85,
            )]),
        ]);

        // Count equals distinct URLs across both queries.
        assert_eq!(merged.results.len(), 2);

        let a = merged
            .results
            .iter()
            .find(|r| r.url == "https://a.com")
            .unwrap();
        // First occurrence wins the title.
        assert_eq!(a.title, "A");
        // Higher score kept.
        assert!((a.score - 0.85).abs() < f64::EPSILON);
        // Chunk union, duplicates dropped, first-seen order.
        assert_eq!(a.content, "alpha [...] beta [...] gamma");
    }

    #[test]
    fn results_sorted_by_score() {
        let merged = merge_responses(vec![response(vec![
            result("https://low.com", "L", "l", 0.2),
            result("https://high.com", "H", "h", 0.9),
        ])]);

        assert_eq!(merged.results[0].url, "https://high.com");
        assert_eq!(merged.results[1].url, "https://low.com");
    }

    #[test]
    fn answers_concatenated_and_images_deduped() {
        let mut r1 = response(vec![]);
        r1.answer = Some("first answer".into());
        r1.images = vec![tavily_client::ImageResult {
            url: "https://img/1".into(),
            description: None,
        }];
        let mut r2 = response(vec![]);
        r2.answer = Some("second answer".into());
        r2.images = vec![
            tavily_client::ImageResult {
                url: "https://img/1".into(),
                description: None,
            },
            tavily_client::ImageResult {
                url: "https://img/2".into(),
                description: None,
            },
        ];

        let merged = merge_responses(vec![r1, r2]);
        assert_eq!(merged.answer.as_deref(), Some("first answer\n\nsecond answer"));
        assert_eq!(merged.images.len(), 2);
    }

    /// Mock API: fails any query containing "bad".
    struct FlakyApi;

    #[async_trait]
    impl SearchApi for FlakyApi {
        async fn search(&self, request: &SearchRequest) -> tavily_client::Result<SearchResponse> {
            if request.query.contains("bad") {
                return Err(TavilyError::Network("connection reset".into()));
            }
            Ok(response(vec![result(
                &format!("https://ok.com/{}", request.query),
                &request.query,
                "content",
                0.5,
            )]))
        }
    }

    #[tokio::test]
    async fn failed_query_does_not_abort_siblings() {
        let queries = vec!["good one".to_string(), "bad one".to_string(), "good two".to_string()];
        let merged = search_dedup(&FlakyApi, &queries, &SearchRequest::new(""))
            .await
            .unwrap();

        assert_eq!(merged.results.len(), 2);
        assert_eq!(merged.failures.len(), 1);
        assert_eq!(merged.failures[0].query, "bad one");
        assert_eq!(merged.queries, vec!["good one", "good two"]);
        assert_eq!(merged.usage.search_count, 2);
    }
}
