//! Shared HTTP client, SSE framing, and error mapping.

use std::sync::OnceLock;

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use super::EventStream;
use crate::error::{ErrorCode, ErrorDetails, ThreadrunError};
use crate::types::StreamEvent;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
///
/// No overall request timeout: run streams stay open for as long as the
/// service keeps producing events.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Headers for the assistants API (bearer token + beta opt-in).
pub fn assistants_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("OpenAI-Beta", HeaderValue::from_static("assistants=v2"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> ThreadrunError {
    match status {
        401 | 403 => ThreadrunError::Authentication(error_message(body)),
        429 => ThreadrunError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => match extract_details(body) {
            Some(details) => ThreadrunError::api_with_details(status, error_message(body), details),
            None => ThreadrunError::api(status, body),
        },
    }
}

fn error_object(body: &str) -> Option<serde_json::Value> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").cloned())
}

fn error_message(body: &str) -> String {
    error_object(body)
        .and_then(|e| e.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

fn extract_details(body: &str) -> Option<ErrorDetails> {
    let error = error_object(body)?;
    let provider_code = error
        .get("code")
        .and_then(|c| c.as_str())
        .or_else(|| error.get("type").and_then(|t| t.as_str()))
        .map(str::to_string);
    let message = error.get("message").and_then(|m| m.as_str()).unwrap_or("");
    let code = if message.contains("already has an active run") {
        Some(ErrorCode::ActiveRunExists)
    } else {
        provider_code.as_deref().map(ErrorCode::from_provider)
    };
    Some(ErrorDetails {
        code,
        provider_code,
        param: error
            .get("param")
            .and_then(|p| p.as_str())
            .map(str::to_string),
    })
}

fn extract_retry_after(body: &str) -> Option<u64> {
    error_object(body)
        .and_then(|e| e.get("retry_after").and_then(|r| r.as_f64()))
        .map(|s| (s * 1000.0) as u64)
}

/// One complete server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental decoder for `text/event-stream` bodies.
///
/// Frames are separated by a blank line; multi-line `data:` fields are
/// joined with `\n`. Frames without an `event:` field default to `message`.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the body, returning every frame it completes.
    pub fn push(&mut self, chunk: &str) -> Vec<SseFrame> {
        self.buffer.push_str(chunk);
        let mut frames = Vec::new();

        while let Some(line_end) = self.buffer.find('\n') {
            let line = self.buffer[..line_end].trim_end_matches('\r').to_string();
            self.buffer.drain(..=line_end);

            if line.is_empty() {
                if let Some(frame) = self.take_frame() {
                    frames.push(frame);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line.as_str(), ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }

        frames
    }

    /// Flush a trailing frame when the body ends without a blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let mut frames = self.push(&format!("{rest}\n"));
            if let Some(frame) = frames.pop() {
                return Some(frame);
            }
        }
        self.take_frame()
    }

    fn take_frame(&mut self) -> Option<SseFrame> {
        if self.data.is_empty() && self.event.is_none() {
            return None;
        }
        let frame = SseFrame {
            event: self.event.take().unwrap_or_else(|| "message".to_string()),
            data: self.data.join("\n"),
        };
        self.data.clear();
        Some(frame)
    }
}

/// Drain the longest valid UTF-8 prefix of `buf`, leaving a split character behind.
fn take_utf8_prefix(buf: &mut Vec<u8>) -> String {
    let valid = match std::str::from_utf8(buf) {
        Ok(s) => s.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => {
            let text = String::from_utf8_lossy(buf).into_owned();
            buf.clear();
            return text;
        }
    };
    let rest = buf.split_off(valid);
    let text = String::from_utf8_lossy(buf).into_owned();
    *buf = rest;
    text
}

/// Turn a streaming HTTP response into typed run events.
///
/// The stream ends at the `done` frame or when the body closes.
pub fn event_stream(resp: reqwest::Response) -> EventStream {
    let byte_stream = resp.bytes_stream();

    let stream = async_stream::stream! {
        let mut decoder = SseDecoder::new();
        let mut pending: Vec<u8> = Vec::new();
        let mut ended = false;
        futures::pin_mut!(byte_stream);

        'body: while let Some(chunk_result) = byte_stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    yield Err(ThreadrunError::Network(e));
                    ended = true;
                    break;
                }
            };

            pending.extend_from_slice(&chunk);
            let text = take_utf8_prefix(&mut pending);
            for frame in decoder.push(&text) {
                match StreamEvent::from_sse(&frame.event, &frame.data) {
                    Ok(Some(event)) => yield Ok(event),
                    Ok(None) => {
                        ended = true;
                        break 'body;
                    }
                    Err(err) => {
                        debug!(event = %frame.event, error = %err, "SSE frame rejected");
                        yield Err(err);
                        ended = true;
                        break 'body;
                    }
                }
            }
        }

        if !ended {
            if let Some(frame) = decoder.finish() {
                match StreamEvent::from_sse(&frame.event, &frame.data) {
                    Ok(Some(event)) => yield Ok(event),
                    Ok(None) => {}
                    Err(err) => yield Err(err),
                }
            }
        }
    };

    Box::pin(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_prefix_keeps_split_characters() {
        let bytes = "héllo".as_bytes();
        let mut buf = bytes[..2].to_vec();
        assert_eq!(take_utf8_prefix(&mut buf), "h");
        assert_eq!(buf, vec![bytes[1]]);
        buf.extend_from_slice(&bytes[2..]);
        assert_eq!(take_utf8_prefix(&mut buf), "éllo");
        assert!(buf.is_empty());
    }

    #[test]
    fn decoder_splits_frames_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push("event: thread.message.delta\nda").is_empty());
        let frames = decoder.push("ta: {\"a\":1}\n\nevent: done\ndata: [DONE]\n\n");
        assert_eq!(
            frames,
            vec![
                SseFrame {
                    event: "thread.message.delta".to_string(),
                    data: "{\"a\":1}".to_string(),
                },
                SseFrame {
                    event: "done".to_string(),
                    data: "[DONE]".to_string(),
                },
            ]
        );
    }

    #[test]
    fn decoder_joins_multiline_data_and_skips_comments() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(": keep-alive\r\ndata: a\r\ndata: b\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "message");
        assert_eq!(frames[0].data, "a\nb");
    }

    #[test]
    fn decoder_flushes_unterminated_frame() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push("event: thread.run.completed\ndata: {}").is_empty());
        let frame = decoder.finish().expect("trailing frame");
        assert_eq!(frame.event, "thread.run.completed");
        assert_eq!(frame.data, "{}");
    }

    #[test]
    fn status_mapping_recognizes_active_run_conflict() {
        let body = r#"{"error":{"message":"Thread thread_1 already has an active run run_2.","type":"invalid_request_error","param":null,"code":null}}"#;
        let err = status_to_error(400, body);
        match err {
            ThreadrunError::Api {
                status, details, ..
            } => {
                assert_eq!(status, 400);
                assert_eq!(details.unwrap().code, Some(ErrorCode::ActiveRunExists));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn status_mapping_handles_auth_and_rate_limit() {
        assert!(matches!(
            status_to_error(401, r#"{"error":{"message":"bad key"}}"#),
            ThreadrunError::Authentication(ref m) if m == "bad key"
        ));
        assert!(matches!(
            status_to_error(429, r#"{"error":{"retry_after":1.5}}"#),
            ThreadrunError::RateLimited {
                retry_after_ms: Some(1500)
            }
        ));
    }
}
