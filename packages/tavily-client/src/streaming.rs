//! SSE consumer for streaming research tasks.
//!
//! Converts a raw `reqwest` byte stream into [`ResearchEvent`] values.
//! Handles `event:`/`data:` line pairs, partial lines, and buffering. Events
//! are emitted in server delivery order; content chunks are never reordered,
//! so concatenating them reconstructs the same report the polling variant
//! returns.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;

use crate::error::{Result, TavilyError};
use crate::research::ResearchReport;
use crate::types::Source;

/// A single event from a streaming research task.
#[derive(Debug, Clone)]
pub enum ResearchEvent {
    /// Incremental report text.
    Content(String),
    /// Structured-output mode: the report arrives as one JSON value.
    StructuredContent(serde_json::Value),
    /// Batch of source citations.
    Sources(Vec<Source>),
    /// The server started a tool invocation (Planning, WebSearch, ...).
    ToolCall {
        id: String,
        name: String,
        arguments: String,
        queries: Vec<String>,
    },
    /// A tool invocation finished.
    ToolResponse {
        id: String,
        name: String,
        source_count: usize,
    },
    /// Stream finished.
    Done,
}

/// Stream adapter turning raw SSE bytes into [`ResearchEvent`] values.
pub struct ResearchStream {
    inner: Pin<Box<dyn Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send>>,
    buffer: String,
    /// Trailing bytes of a multi-byte char split across network chunks.
    partial: Vec<u8>,
    current_event: Option<String>,
    pending: VecDeque<ResearchEvent>,
    done: bool,
}

impl ResearchStream {
    pub(crate) fn new(
        byte_stream: impl Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            buffer: String::new(),
            partial: Vec::new(),
            current_event: None,
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Drain the stream and reconstruct the final report.
    ///
    /// Content chunks are concatenated in arrival order; sources accumulate
    /// across batches. The result matches what polling the same task would
    /// have returned.
    pub async fn collect_report(mut self, request_id: &str) -> Result<ResearchReport> {
        let mut content = String::new();
        let mut sources = Vec::new();

        while let Some(event) = self.next().await {
            match event? {
                ResearchEvent::Content(chunk) => content.push_str(&chunk),
                ResearchEvent::StructuredContent(value) => {
                    content = value.to_string();
                }
                ResearchEvent::Sources(batch) => sources.extend(batch),
                ResearchEvent::Done => break,
                ResearchEvent::ToolCall { .. } | ResearchEvent::ToolResponse { .. } => {}
            }
        }

        Ok(ResearchReport {
            request_id: request_id.to_string(),
            content,
            sources,
            response_time: None,
        })
    }

    /// Consume complete lines from the buffer into pending events.
    fn drain_buffer(&mut self) -> Option<TavilyError> {
        while let Some(newline_pos) = self.buffer.find('\n') {
            let line = self.buffer[..newline_pos].trim().to_string();
            self.buffer.drain(..=newline_pos);

            if line.is_empty() {
                // Blank line ends the current SSE event.
                self.current_event = None;
                continue;
            }

            if let Some(event_type) = line.strip_prefix("event:") {
                let event_type = event_type.trim();
                if event_type == "done" {
                    self.pending.push_back(ResearchEvent::Done);
                    self.done = true;
                    self.current_event = None;
                } else {
                    self.current_event = Some(event_type.to_string());
                }
                continue;
            }

            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim();
                if self.current_event.as_deref() != Some("chat.completion.chunk") {
                    continue;
                }
                match parse_chunk(data) {
                    Ok(events) => self.pending.extend(events),
                    Err(err) => return Some(err),
                }
            }

            // Other SSE fields (id:, retry:) are ignored.
        }
        None
    }
}

impl Stream for ResearchStream {
    type Item = Result<ResearchEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if this.done {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.partial.extend_from_slice(&bytes);
                    match take_valid_utf8(&mut this.partial) {
                        Ok(text) => this.buffer.push_str(&text),
                        Err(err) => return Poll::Ready(Some(Err(err))),
                    }
                    if let Some(err) = this.drain_buffer() {
                        return Poll::Ready(Some(Err(err)));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(TavilyError::Network(e.to_string()))));
                }
                Poll::Ready(None) => {
                    if !this.partial.is_empty() {
                        this.partial.clear();
                        return Poll::Ready(Some(Err(TavilyError::Parse(
                            "stream ended mid-character".into(),
                        ))));
                    }
                    // Flush whatever remains without a trailing newline.
                    if !this.buffer.is_empty() {
                        this.buffer.push('\n');
                        if let Some(err) = this.drain_buffer() {
                            return Poll::Ready(Some(Err(err)));
                        }
                        continue;
                    }
                    return Poll::Ready(this.pending.pop_front().map(Ok));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Decode the valid UTF-8 prefix of `pending`, leaving behind the trailing
/// bytes of a character the next network chunk will complete. Bytes that can
/// never form a valid character are an error.
fn take_valid_utf8(pending: &mut Vec<u8>) -> Result<String> {
    match std::str::from_utf8(pending) {
        Ok(text) => {
            let text = text.to_string();
            pending.clear();
            Ok(text)
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let text = String::from_utf8_lossy(&pending[..valid]).into_owned();
            pending.drain(..valid);
            Ok(text)
        }
        Err(e) => Err(TavilyError::Parse(format!("invalid UTF-8 in stream: {}", e))),
    }
}

/// Parse one `chat.completion.chunk` payload. A single delta may carry
/// content, sources, and tool-call data at once, hence a list of events.
fn parse_chunk(data: &str) -> Result<Vec<ResearchEvent>> {
    let value: serde_json::Value = serde_json::from_str(data).map_err(|e| {
        let preview: String = data.chars().take(200).collect();
        TavilyError::Parse(format!("failed to parse stream chunk: {} (data: {})", e, preview))
    })?;

    let mut events = Vec::new();
    let Some(delta) = value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("delta"))
    else {
        return Ok(events);
    };

    match delta.get("content") {
        Some(serde_json::Value::String(text)) => {
            events.push(ResearchEvent::Content(text.clone()));
        }
        Some(value @ serde_json::Value::Object(_)) => {
            events.push(ResearchEvent::StructuredContent(value.clone()));
        }
        _ => {}
    }

    if let Some(sources) = delta.get("sources") {
        let batch: Vec<Source> =
            serde_json::from_value(sources.clone()).unwrap_or_default();
        if !batch.is_empty() {
            events.push(ResearchEvent::Sources(batch));
        }
    }

    if let Some(tool_data) = delta.get("tool_calls").and_then(|t| t.as_object()) {
        let call_type = tool_data.get("type").and_then(|t| t.as_str()).unwrap_or("");

        if call_type == "tool_call" {
            for item in tool_data
                .get("tool_call")
                .and_then(|v| v.as_array())
                .into_iter()
                .flatten()
            {
                events.push(ResearchEvent::ToolCall {
                    id: str_field(item, "id"),
                    name: str_field(item, "name"),
                    arguments: str_field(item, "arguments"),
                    queries: item
                        .get("queries")
                        .and_then(|q| q.as_array())
                        .map(|arr| {
                            arr.iter()
                                .filter_map(|q| q.as_str().map(String::from))
                                .collect()
                        })
                        .unwrap_or_default(),
                });
            }
        } else if call_type == "tool_response" {
            for item in tool_data
                .get("tool_response")
                .and_then(|v| v.as_array())
                .into_iter()
                .flatten()
            {
                events.push(ResearchEvent::ToolResponse {
                    id: str_field(item, "id"),
                    name: str_field(item, "name"),
                    source_count: item
                        .get("sources")
                        .and_then(|s| s.as_array())
                        .map(|s| s.len())
                        .unwrap_or(0),
                });
            }
        }
    }

    Ok(events)
}

fn str_field(value: &serde_json::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_sse_bytes(lines: &[&str]) -> Vec<std::result::Result<Bytes, reqwest::Error>> {
        lines
            .iter()
            .map(|line| Ok(Bytes::from(format!("{}\n", line))))
            .collect()
    }

    fn stream_from(lines: &[&str]) -> ResearchStream {
        ResearchStream::new(futures::stream::iter(make_sse_bytes(lines)))
    }

    #[tokio::test]
    async fn content_chunks_arrive_in_order() {
        let mut stream = stream_from(&[
            "event: chat.completion.chunk",
            r#"data: {"choices":[{"delta":{"content":"The state "}}]}"#,
            "",
            "event: chat.completion.chunk",
            r#"data: {"choices":[{"delta":{"content":"of Wasm"}}]}"#,
            "",
            "event: done",
        ]);

        let first = stream.next().await.unwrap().unwrap();
        assert!(matches!(first, ResearchEvent::Content(ref c) if c == "The state "));

        let second = stream.next().await.unwrap().unwrap();
        assert!(matches!(second, ResearchEvent::Content(ref c) if c == "of Wasm"));

        let done = stream.next().await.unwrap().unwrap();
        assert!(matches!(done, ResearchEvent::Done));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn collect_report_matches_polling_shape() {
        let stream = stream_from(&[
            "event: chat.completion.chunk",
            r#"data: {"choices":[{"delta":{"content":"Hello "}}]}"#,
            "",
            "event: chat.completion.chunk",
            r#"data: {"choices":[{"delta":{"content":"world"}}]}"#,
            "",
            "event: chat.completion.chunk",
            r#"data: {"choices":[{"delta":{"sources":[{"url":"https://example.com/a","title":"A"}]}}]}"#,
            "",
            "event: done",
        ]);

        let report = stream.collect_report("req-9").await.unwrap();
        assert_eq!(report.request_id, "req-9");
        assert_eq!(report.content, "Hello world");
        assert_eq!(report.sources.len(), 1);
        assert_eq!(report.sources[0].url, "https://example.com/a");
    }

    #[tokio::test]
    async fn tool_call_events_are_parsed() {
        let mut stream = stream_from(&[
            "event: chat.completion.chunk",
            r#"data: {"choices":[{"delta":{"tool_calls":{"type":"tool_call","tool_call":[{"id":"t1","name":"WebSearch","arguments":"wasm runtimes","queries":["wasmtime","wasmer"]}]}}}]}"#,
            "",
            "event: chat.completion.chunk",
            r#"data: {"choices":[{"delta":{"tool_calls":{"type":"tool_response","tool_response":[{"id":"t1","name":"WebSearch","sources":[{"url":"https://a"},{"url":"https://b"}]}]}}}]}"#,
            "",
            "event: done",
        ]);

        match stream.next().await.unwrap().unwrap() {
            ResearchEvent::ToolCall { name, queries, .. } => {
                assert_eq!(name, "WebSearch");
                assert_eq!(queries, vec!["wasmtime", "wasmer"]);
            }
            other => panic!("expected ToolCall, got {other:?}"),
        }

        match stream.next().await.unwrap().unwrap() {
            ResearchEvent::ToolResponse { source_count, .. } => assert_eq!(source_count, 2),
            other => panic!("expected ToolResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn structured_content_replaces_text() {
        let stream = stream_from(&[
            "event: chat.completion.chunk",
            r#"data: {"choices":[{"delta":{"content":{"topic":"wasm","summary":"ok"}}}]}"#,
            "",
            "event: done",
        ]);

        let report = stream.collect_report("req-2").await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&report.content).unwrap();
        assert_eq!(value["topic"], "wasm");
    }

    #[tokio::test]
    async fn data_without_chunk_event_is_ignored() {
        let stream = stream_from(&[
            "event: ping",
            r#"data: {"choices":[{"delta":{"content":"noise"}}]}"#,
            "",
            "event: done",
        ]);

        let report = stream.collect_report("req-3").await.unwrap();
        assert_eq!(report.content, "");
    }

    #[tokio::test]
    async fn multibyte_char_split_across_byte_chunks() {
        let sse = "event: chat.completion.chunk\ndata: {\"choices\":[{\"delta\":{\"content\":\"café\"}}]}\n\nevent: done\n";
        let raw = sse.as_bytes();
        // Split inside the two-byte 'é'.
        let mid = sse.find('é').unwrap() + 1;
        let bytes: Vec<std::result::Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::copy_from_slice(&raw[..mid])),
            Ok(Bytes::copy_from_slice(&raw[mid..])),
        ];
        let mut stream = ResearchStream::new(futures::stream::iter(bytes));

        let event = stream.next().await.unwrap().unwrap();
        assert!(matches!(event, ResearchEvent::Content(ref c) if c == "café"));
        let done = stream.next().await.unwrap().unwrap();
        assert!(matches!(done, ResearchEvent::Done));
    }

    #[test]
    fn incomplete_utf8_tail_is_held_back() {
        let mut pending = "caf\u{e9}".as_bytes().to_vec();
        pending.pop(); // drop the second byte of 'é'
        let text = take_valid_utf8(&mut pending).unwrap();
        assert_eq!(text, "caf");
        assert_eq!(pending.len(), 1);

        pending.push(0xa9); // complete the character
        let rest = take_valid_utf8(&mut pending).unwrap();
        assert_eq!(rest, "é");
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn split_lines_across_byte_chunks() {
        let bytes: Vec<std::result::Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::from("event: chat.comp")),
            Ok(Bytes::from("letion.chunk\ndata: {\"choices\":[{\"delta\":{\"content\":\"ab\"}}]}\n")),
            Ok(Bytes::from("\nevent: done\n")),
        ];
        let mut stream = ResearchStream::new(futures::stream::iter(bytes));

        let event = stream.next().await.unwrap().unwrap();
        assert!(matches!(event, ResearchEvent::Content(ref c) if c == "ab"));
        let done = stream.next().await.unwrap().unwrap();
        assert!(matches!(done, ResearchEvent::Done));
    }
}
