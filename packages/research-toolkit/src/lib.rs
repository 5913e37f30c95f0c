//! Research workflows composed from the search and model clients.
//!
//! Each tool pairs web retrieval with whatever cleanup or model work makes
//! its output directly usable: deduplicated multi-query search, extraction
//! with per-page summaries, whole-site crawl summaries, and domain-scoped
//! social search. Everything reports its own [`usage::ToolUsage`].

pub mod crawl;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod format;
pub mod search;
pub mod social;
pub mod synthesis;
pub mod usage;

pub use crawl::{crawl_and_summarize, CrawlApi, CrawlSummary};
pub use dedup::{merge_responses, search_dedup, DedupedSearch, QueryFailure, SearchApi, CHUNK_SEPARATOR};
pub use error::{Result, ToolkitError};
pub use extract::{extract_and_summarize, ExtractApi, ExtractSummary, PageSummary};
pub use format::{clean_formatted_output, clean_raw_content, format_web_results};
pub use search::{search_and_format, FormattedSearch, DEFAULT_SCORE_THRESHOLD, MAX_FORMATTED_RESULTS};
pub use social::{social_media_search, Platform, SocialSearch};
pub use synthesis::{generate_subqueries, synthesize_results, Subqueries, Synthesis};
pub use usage::{ApiUsage, LlmUsage, ToolUsage};
