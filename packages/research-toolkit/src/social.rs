//! Domain-scoped social media search.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::Serialize;
use tavily_client::{ExtractRequest, SearchRequest, SearchResult};

use crate::dedup::SearchApi;
use crate::error::{Result, ToolkitError};
use crate::extract::ExtractApi;
use crate::format::clean_raw_content;
use crate::usage::ToolUsage;

/// Social platforms the search can be scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Tiktok,
    Facebook,
    Instagram,
    Reddit,
    Linkedin,
    X,
    /// All supported platforms at once.
    Combined,
}

impl Platform {
    /// Domains to restrict the search to.
    pub fn domains(&self) -> Vec<&'static str> {
        match self {
            Platform::Tiktok => vec!["tiktok.com"],
            Platform::Facebook => vec!["facebook.com"],
            Platform::Instagram => vec!["instagram.com"],
            Platform::Reddit => vec!["reddit.com"],
            Platform::Linkedin => vec!["linkedin.com"],
            Platform::X => vec!["x.com", "twitter.com"],
            Platform::Combined => vec![
                "tiktok.com",
                "facebook.com",
                "instagram.com",
                "reddit.com",
                "linkedin.com",
                "x.com",
                "twitter.com",
            ],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Tiktok => "tiktok",
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Reddit => "reddit",
            Platform::Linkedin => "linkedin",
            Platform::X => "x",
            Platform::Combined => "combined",
        };
        f.write_str(name)
    }
}

impl FromStr for Platform {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tiktok" => Ok(Platform::Tiktok),
            "facebook" => Ok(Platform::Facebook),
            "instagram" => Ok(Platform::Instagram),
            "reddit" => Ok(Platform::Reddit),
            "linkedin" => Ok(Platform::Linkedin),
            "x" | "twitter" => Ok(Platform::X),
            "combined" | "all" => Ok(Platform::Combined),
            other => Err(ToolkitError::Input(format!(
                "Unknown platform '{other}'; expected one of tiktok, facebook, \
                 instagram, reddit, linkedin, x, combined"
            ))),
        }
    }
}

/// Output of [`social_media_search`].
#[derive(Debug, Clone, Serialize)]
pub struct SocialSearch {
    pub platform: Platform,
    /// Search results, with raw content merged in when extraction ran.
    pub results: Vec<SearchResult>,
    /// Error from the follow-up extraction, when it failed. Search results
    /// are still present.
    pub extract_error: Option<String>,
    pub usage: ToolUsage,
    pub response_time: f64,
}

/// Search a social platform, optionally pulling full post content.
///
/// When `include_raw_content` is set, the result URLs go through the extract
/// endpoint and the extracted text is merged back onto the matching result.
/// Extraction failing leaves the search results intact with the error
/// recorded.
pub async fn social_media_search(
    search_api: &impl SearchApi,
    extract_api: &impl ExtractApi,
    query: &str,
    platform: Platform,
    include_raw_content: bool,
    params: &SearchRequest,
) -> Result<SocialSearch> {
    if query.trim().is_empty() {
        return Err(ToolkitError::Input("Query must not be empty".into()));
    }
    let started = Instant::now();

    let request = params
        .with_query(query)
        .include_domains(platform.domains().iter().map(|d| d.to_string()).collect());
    let response = search_api.search(&request).await?;

    let mut usage = ToolUsage::default();
    usage.api.add_search(response.response_time);
    let mut results = response.results;
    let mut extract_error = None;

    if include_raw_content && !results.is_empty() {
        let urls: Vec<String> = results.iter().map(|r| r.url.clone()).collect();
        match extract_api.extract(&ExtractRequest::new(urls)).await {
            Ok(extracted) => {
                usage.api.add_extract(extracted.response_time);
                let mut by_url: HashMap<String, String> = extracted
                    .results
                    .into_iter()
                    .map(|page| (page.url, clean_raw_content(&page.raw_content)))
                    .collect();
                for result in &mut results {
                    if let Some(content) = by_url.remove(&result.url) {
                        result.raw_content = Some(content);
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Post extraction failed; returning search results only");
                extract_error = Some(err.to_string());
            }
        }
    }

    usage.response_time = started.elapsed().as_secs_f64();
    tracing::info!(
        platform = %platform,
        results = results.len(),
        extracted = include_raw_content && extract_error.is_none(),
        "Social search complete"
    );

    Ok(SocialSearch {
        platform,
        results,
        extract_error,
        usage,
        response_time: started.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tavily_client::{
        ExtractResponse, ExtractResult, SearchResponse, TavilyError,
    };

    struct StubSearch {
        seen_domains: Mutex<Option<Vec<String>>>,
        results: Vec<SearchResult>,
    }

    #[async_trait]
    impl SearchApi for StubSearch {
        async fn search(&self, request: &SearchRequest) -> tavily_client::Result<SearchResponse> {
            *self.seen_domains.lock().unwrap() = request.include_domains.clone();
            Ok(SearchResponse {
                query: request.query.clone(),
                answer: None,
                images: Vec::new(),
                results: self.results.clone(),
                response_time: 0.1,
            })
        }
    }

    struct StubExtract {
        outcome: std::result::Result<Vec<ExtractResult>, String>,
    }

    #[async_trait]
    impl ExtractApi for StubExtract {
        async fn extract(
            &self,
            _request: &ExtractRequest,
        ) -> tavily_client::Result<ExtractResponse> {
            match &self.outcome {
                Ok(results) => Ok(ExtractResponse {
                    results: results.clone(),
                    failed_results: Vec::new(),
                    response_time: 0.2,
                }),
                Err(message) => Err(TavilyError::Api {
                    status: 500,
                    message: message.clone(),
                }),
            }
        }
    }

    fn reddit_result() -> SearchResult {
        SearchResult {
            url: "https://reddit.com/r/rust/post".into(),
            title: "A post".into(),
            content: "snippet".into(),
            score: 0.7,
            raw_content: None,
            published_date: None,
            favicon: None,
        }
    }

    #[tokio::test]
    async fn scopes_search_to_platform_domains() {
        let search = StubSearch {
            seen_domains: Mutex::new(None),
            results: vec![reddit_result()],
        };
        let extract = StubExtract {
            outcome: Ok(Vec::new()),
        };

        social_media_search(
            &search,
            &extract,
            "rust async",
            Platform::Reddit,
            false,
            &SearchRequest::new(""),
        )
        .await
        .unwrap();

        let domains = search.seen_domains.lock().unwrap().clone().unwrap();
        assert_eq!(domains, vec!["reddit.com".to_string()]);
    }

    #[tokio::test]
    async fn merges_extracted_content_per_url() {
        let search = StubSearch {
            seen_domains: Mutex::new(None),
            results: vec![reddit_result()],
        };
        let extract = StubExtract {
            outcome: Ok(vec![ExtractResult {
                url: "https://reddit.com/r/rust/post".into(),
                raw_content: "the full post body".into(),
                images: Vec::new(),
            }]),
        };

        let out = social_media_search(
            &search,
            &extract,
            "rust async",
            Platform::Reddit,
            true,
            &SearchRequest::new(""),
        )
        .await
        .unwrap();

        assert_eq!(
            out.results[0].raw_content.as_deref(),
            Some("the full post body")
        );
        assert!(out.extract_error.is_none());
        assert_eq!(out.usage.api.extract_count, 1);
    }

    #[tokio::test]
    async fn extract_failure_keeps_search_results() {
        let search = StubSearch {
            seen_domains: Mutex::new(None),
            results: vec![reddit_result()],
        };
        let extract = StubExtract {
            outcome: Err("upstream 500".into()),
        };

        let out = social_media_search(
            &search,
            &extract,
            "rust async",
            Platform::Reddit,
            true,
            &SearchRequest::new(""),
        )
        .await
        .unwrap();

        assert_eq!(out.results.len(), 1);
        assert!(out.results[0].raw_content.is_none());
        assert!(out.extract_error.unwrap().contains("upstream 500"));
    }

    #[test]
    fn platform_parses_aliases() {
        assert_eq!("twitter".parse::<Platform>().unwrap(), Platform::X);
        assert_eq!("all".parse::<Platform>().unwrap(), Platform::Combined);
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn combined_covers_every_platform() {
        let combined = Platform::Combined.domains();
        for platform in [
            Platform::Tiktok,
            Platform::Facebook,
            Platform::Instagram,
            Platform::Reddit,
            Platform::Linkedin,
            Platform::X,
        ] {
            for domain in platform.domains() {
                assert!(combined.contains(&domain));
            }
        }
    }
}
