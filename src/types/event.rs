//! Run stream events.

use serde::{Deserialize, Serialize};

use super::run::{Run, RunStep};
use crate::error::ThreadrunError;

/// One event from a run's server-sent event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental assistant message content.
    MessageDelta(MessageDelta),
    /// The run is paused until tool outputs are submitted.
    RunRequiresAction(Run),
    RunCompleted(Run),
    RunFailed(Run),
    RunCancelling(Run),
    RunCancelled(Run),
    RunExpired(Run),
    RunStepFailed(RunStep),
    RunStepCancelled(RunStep),
    /// Any event the processor does not act on.
    Other { event: String },
}

pub const MESSAGE_DELTA: &str = "thread.message.delta";
pub const RUN_REQUIRES_ACTION: &str = "thread.run.requires_action";
pub const RUN_COMPLETED: &str = "thread.run.completed";
pub const RUN_FAILED: &str = "thread.run.failed";
pub const RUN_CANCELLING: &str = "thread.run.cancelling";
pub const RUN_CANCELLED: &str = "thread.run.cancelled";
pub const RUN_EXPIRED: &str = "thread.run.expired";
pub const RUN_STEP_FAILED: &str = "thread.run.step.failed";
pub const RUN_STEP_CANCELLED: &str = "thread.run.step.cancelled";
pub const DONE: &str = "done";
pub const ERROR: &str = "error";

impl StreamEvent {
    /// Decode one SSE frame.
    ///
    /// Returns `Ok(None)` for the terminating `done` frame and an error for
    /// the transport-level `error` frame.
    pub fn from_sse(event: &str, data: &str) -> Result<Option<Self>, ThreadrunError> {
        let parsed = match event {
            DONE => return Ok(None),
            ERROR => return Err(ThreadrunError::Stream(stream_error_message(data))),
            MESSAGE_DELTA => Self::MessageDelta(serde_json::from_str(data)?),
            RUN_REQUIRES_ACTION => Self::RunRequiresAction(serde_json::from_str(data)?),
            RUN_COMPLETED => Self::RunCompleted(serde_json::from_str(data)?),
            RUN_FAILED => Self::RunFailed(serde_json::from_str(data)?),
            RUN_CANCELLING => Self::RunCancelling(serde_json::from_str(data)?),
            RUN_CANCELLED => Self::RunCancelled(serde_json::from_str(data)?),
            RUN_EXPIRED => Self::RunExpired(serde_json::from_str(data)?),
            RUN_STEP_FAILED => Self::RunStepFailed(serde_json::from_str(data)?),
            RUN_STEP_CANCELLED => Self::RunStepCancelled(serde_json::from_str(data)?),
            other => Self::Other {
                event: other.to_string(),
            },
        };
        Ok(Some(parsed))
    }

    /// Wire name of the event.
    pub fn name(&self) -> &str {
        match self {
            Self::MessageDelta(_) => MESSAGE_DELTA,
            Self::RunRequiresAction(_) => RUN_REQUIRES_ACTION,
            Self::RunCompleted(_) => RUN_COMPLETED,
            Self::RunFailed(_) => RUN_FAILED,
            Self::RunCancelling(_) => RUN_CANCELLING,
            Self::RunCancelled(_) => RUN_CANCELLED,
            Self::RunExpired(_) => RUN_EXPIRED,
            Self::RunStepFailed(_) => RUN_STEP_FAILED,
            Self::RunStepCancelled(_) => RUN_STEP_CANCELLED,
            Self::Other { event } => event,
        }
    }

    /// Shorthand for a delta carrying a single text fragment.
    pub fn text(fragment: impl Into<String>) -> Self {
        Self::MessageDelta(MessageDelta::text("msg", fragment))
    }
}

fn stream_error_message(data: &str) -> String {
    serde_json::from_str::<serde_json::Value>(data)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error").and_then(|e| e.get("message")))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| data.to_string())
}

/// Payload of a `thread.message.delta` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageDelta {
    pub id: String,
    pub delta: MessageDeltaBody,
}

impl MessageDelta {
    pub fn text(id: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            delta: MessageDeltaBody {
                content: vec![DeltaContent::Text {
                    text: TextDelta {
                        value: Some(fragment.into()),
                    },
                }],
            },
        }
    }

    /// Text fragments in the order they appear in the delta.
    pub fn text_fragments(&self) -> impl Iterator<Item = &str> {
        self.delta.content.iter().filter_map(|part| match part {
            DeltaContent::Text { text } => text.value.as_deref(),
            DeltaContent::Other => None,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageDeltaBody {
    #[serde(default)]
    pub content: Vec<DeltaContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeltaContent {
    Text { text: TextDelta },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextDelta {
    #[serde(default)]
    pub value: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::run::RunStatus;

    #[test]
    fn message_delta_yields_text_parts_in_order() {
        let data = r#"{
            "id": "msg_1",
            "object": "thread.message.delta",
            "delta": { "content": [
                { "index": 0, "type": "text", "text": { "value": "Hel", "annotations": [] } },
                { "index": 1, "type": "image_file", "image_file": { "file_id": "f" } },
                { "index": 2, "type": "text", "text": { "value": "lo" } }
            ] }
        }"#;
        let event = StreamEvent::from_sse(MESSAGE_DELTA, data).unwrap().unwrap();
        let StreamEvent::MessageDelta(delta) = event else {
            panic!("expected message delta");
        };
        assert_eq!(delta.text_fragments().collect::<Vec<_>>(), vec!["Hel", "lo"]);
    }

    #[test]
    fn done_frame_ends_stream() {
        assert!(StreamEvent::from_sse(DONE, "[DONE]").unwrap().is_none());
    }

    #[test]
    fn error_frame_is_stream_error() {
        let err = StreamEvent::from_sse(ERROR, r#"{"message":"boom"}"#).unwrap_err();
        assert!(matches!(err, ThreadrunError::Stream(ref m) if m == "boom"));
    }

    #[test]
    fn unknown_events_are_other() {
        let event = StreamEvent::from_sse("thread.run.step.delta", "{}")
            .unwrap()
            .unwrap();
        assert_eq!(event.name(), "thread.run.step.delta");
    }

    #[test]
    fn run_event_carries_run_snapshot() {
        let event = StreamEvent::from_sse(
            RUN_FAILED,
            r#"{"id":"run_9","status":"failed","last_error":{"code":"server_error","message":"oops"}}"#,
        )
        .unwrap()
        .unwrap();
        let StreamEvent::RunFailed(run) = event else {
            panic!("expected run failed");
        };
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.last_error.unwrap().message, "oops");
    }
}
