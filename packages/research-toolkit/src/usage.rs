//! Usage accounting for tool calls.
//!
//! Every tool returns the API and LLM work it performed so callers can track
//! spend without scraping logs. Counters only serialize once used.

use serde::Serialize;

/// Search/extract/crawl API usage for one tool call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApiUsage {
    pub search_count: u32,
    pub extract_count: u32,
    pub crawl_count: u32,
    pub search_response_time: f64,
    pub extract_response_time: f64,
    pub crawl_response_time: f64,
}

impl ApiUsage {
    pub fn add_search(&mut self, response_time: f64) {
        self.search_count += 1;
        self.search_response_time += response_time;
    }

    pub fn add_extract(&mut self, response_time: f64) {
        self.extract_count += 1;
        self.extract_response_time += response_time;
    }

    pub fn add_crawl(&mut self, response_time: f64) {
        self.crawl_count += 1;
        self.crawl_response_time += response_time;
    }

    pub fn merge(&mut self, other: &ApiUsage) {
        self.search_count += other.search_count;
        self.extract_count += other.extract_count;
        self.crawl_count += other.crawl_count;
        self.search_response_time += other.search_response_time;
        self.extract_response_time += other.extract_response_time;
        self.crawl_response_time += other.crawl_response_time;
    }

    pub fn is_empty(&self) -> bool {
        self.search_count == 0 && self.extract_count == 0 && self.crawl_count == 0
    }
}

/// LLM token usage for one tool call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LlmUsage {
    pub total_input_tokens: u32,
    pub total_output_tokens: u32,
    pub call_count: u32,
}

impl LlmUsage {
    pub fn total_tokens(&self) -> u32 {
        self.total_input_tokens + self.total_output_tokens
    }

    pub fn add_call(&mut self, usage: Option<&llm_client::Usage>) {
        self.call_count += 1;
        if let Some(usage) = usage {
            self.total_input_tokens += usage.prompt_tokens;
            self.total_output_tokens += usage.completion_tokens;
        }
    }

    pub fn merge(&mut self, other: &LlmUsage) {
        self.total_input_tokens += other.total_input_tokens;
        self.total_output_tokens += other.total_output_tokens;
        self.call_count += other.call_count;
    }
}

/// Roll-up for a whole tool call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolUsage {
    /// Wall-clock time for the tool call, seconds.
    pub response_time: f64,
    #[serde(skip_serializing_if = "ApiUsage::is_empty")]
    pub api: ApiUsage,
    #[serde(skip_serializing_if = "is_llm_unused")]
    pub llm: LlmUsage,
}

fn is_llm_unused(llm: &LlmUsage) -> bool {
    llm.call_count == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_sections_are_skipped() {
        let mut usage = ToolUsage::default();
        usage.api.add_search(1.5);
        usage.response_time = 2.0;

        let json = serde_json::to_value(&usage).unwrap();
        assert_eq!(json["api"]["search_count"], 1);
        assert!(json.get("llm").is_none());
    }

    #[test]
    fn merge_accumulates() {
        let mut a = ApiUsage::default();
        a.add_search(1.0);
        let mut b = ApiUsage::default();
        b.add_search(2.0);
        b.add_extract(0.5);

        a.merge(&b);
        assert_eq!(a.search_count, 2);
        assert_eq!(a.extract_count, 1);
        assert!((a.search_response_time - 3.0).abs() < f64::EPSILON);
    }
}
