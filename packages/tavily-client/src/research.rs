//! Polling loop for long-running research tasks.
//!
//! A submitted task returns a `request_id`; the server owns the task state and
//! this module only reads it. Polling runs on a fixed interval and stops at a
//! terminal status (`completed` or `failed`) or when the wait budget runs out.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::{Result, TavilyError};
use crate::types::{ResearchStatus, ResearchTask, Source};
use crate::TavilyClient;

/// Polling policy for [`poll_research`].
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Fixed delay between status reads.
    pub poll_interval: Duration,
    /// Total wait budget. Exceeding it is a [`TavilyError::Timeout`], not a
    /// silent loop.
    pub max_wait: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(300),
        }
    }
}

/// Final report from a completed research task.
#[derive(Debug, Clone)]
pub struct ResearchReport {
    pub request_id: String,
    pub content: String,
    pub sources: Vec<Source>,
    pub response_time: Option<f64>,
}

/// Status-read seam for the poll loop (mockable in tests).
#[async_trait]
pub trait ResearchApi: Send + Sync {
    async fn research_status(&self, request_id: &str) -> Result<ResearchTask>;
}

#[async_trait]
impl ResearchApi for TavilyClient {
    async fn research_status(&self, request_id: &str) -> Result<ResearchTask> {
        self.get_research(request_id).await
    }
}

/// Poll a research task until it reaches a terminal status.
///
/// A `failed` task surfaces the server-supplied error message verbatim and
/// stops immediately; no further status reads are issued.
pub async fn poll_research(
    api: &impl ResearchApi,
    request_id: &str,
    options: PollOptions,
) -> Result<ResearchReport> {
    let started = Instant::now();

    loop {
        let task = api.research_status(request_id).await?;

        match task.status {
            ResearchStatus::Completed => {
                tracing::info!(
                    request_id,
                    elapsed_secs = started.elapsed().as_secs(),
                    sources = task.sources.len(),
                    "Research completed"
                );
                return Ok(report_from_task(request_id, task));
            }
            ResearchStatus::Failed => {
                let message = task.error.unwrap_or_else(|| "unknown error".to_string());
                tracing::warn!(request_id, error = %message, "Research failed");
                return Err(TavilyError::TaskFailed(message));
            }
            status => {
                tracing::debug!(request_id, ?status, "Research still in progress");
            }
        }

        // Stop before sleeping past the deadline.
        if started.elapsed() + options.poll_interval > options.max_wait {
            return Err(TavilyError::Timeout {
                waited_secs: started.elapsed().as_secs(),
            });
        }

        tokio::time::sleep(options.poll_interval).await;
    }
}

fn report_from_task(request_id: &str, task: ResearchTask) -> ResearchReport {
    ResearchReport {
        request_id: request_id.to_string(),
        content: task.content.unwrap_or_default(),
        sources: task.sources,
        response_time: task.response_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedApi {
        responses: Mutex<Vec<ResearchTask>>,
        calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn new(responses: Vec<ResearchTask>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ResearchApi for ScriptedApi {
        async fn research_status(&self, _request_id: &str) -> Result<ResearchTask> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| TavilyError::Network("no more scripted responses".into()))
        }
    }

    fn task(status: ResearchStatus) -> ResearchTask {
        ResearchTask {
            request_id: "req-1".into(),
            status,
            content: None,
            sources: Vec::new(),
            response_time: None,
            error: None,
        }
    }

    fn fast_options() -> PollOptions {
        PollOptions {
            poll_interval: Duration::from_millis(5),
            max_wait: Duration::from_secs(10),
        }
    }

    #[tokio::test]
    async fn polls_until_completed() {
        let completed = ResearchTask {
            content: Some("Final report".into()),
            sources: vec![Source {
                url: "https://example.com/a".into(),
                title: Some("Source A".into()),
                citation: None,
            }],
            response_time: Some(42.0),
            ..task(ResearchStatus::Completed)
        };
        let api = ScriptedApi::new(vec![
            task(ResearchStatus::Pending),
            task(ResearchStatus::Pending),
            completed,
        ]);

        let report = poll_research(&api, "req-1", fast_options()).await.unwrap();

        assert_eq!(api.call_count(), 3);
        assert_eq!(report.content, "Final report");
        assert_eq!(report.sources.len(), 1);
        assert_eq!(report.sources[0].url, "https://example.com/a");
    }

    #[tokio::test]
    async fn failed_task_surfaces_error_verbatim_without_further_polls() {
        let failed = ResearchTask {
            error: Some("quota exceeded".into()),
            ..task(ResearchStatus::Failed)
        };
        let api = ScriptedApi::new(vec![failed]);

        let err = poll_research(&api, "req-1", fast_options()).await.unwrap_err();

        assert_eq!(api.call_count(), 1);
        match err {
            TavilyError::TaskFailed(message) => assert_eq!(message, "quota exceeded"),
            other => panic!("expected TaskFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn exceeding_max_wait_is_a_timeout() {
        let api = ScriptedApi::new(vec![
            task(ResearchStatus::Pending),
            task(ResearchStatus::Processing),
            task(ResearchStatus::Processing),
            task(ResearchStatus::Processing),
        ]);
        let options = PollOptions {
            poll_interval: Duration::from_millis(5),
            max_wait: Duration::from_millis(12),
        };

        let err = poll_research(&api, "req-1", options).await.unwrap_err();
        assert!(matches!(err, TavilyError::Timeout { .. }));
    }

    #[tokio::test]
    async fn unknown_status_keeps_polling() {
        let api = ScriptedApi::new(vec![
            task(ResearchStatus::Unknown),
            task(ResearchStatus::Completed),
        ]);

        let report = poll_research(&api, "req-1", fast_options()).await.unwrap();
        assert_eq!(api.call_count(), 2);
        assert_eq!(report.content, "");
    }
}
