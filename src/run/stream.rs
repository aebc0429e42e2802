//! Turning a run's event stream into a lazy stream of text fragments.

use std::sync::Arc;

use async_stream::try_stream;
use futures::StreamExt;
use tracing::{debug, info, warn};

use super::TextStream;
use crate::error::ThreadrunError;
use crate::service::{ConversationService, EventStream};
use crate::tools::{to_outputs, ToolDispatcher, ToolExecutionContext};
use crate::types::event::{
    RUN_CANCELLED, RUN_CANCELLING, RUN_EXPIRED, RUN_FAILED, RUN_STEP_CANCELLED, RUN_STEP_FAILED,
};
use crate::types::{Run, RunStep, StreamEvent};

/// Drains run events, answering tool calls as they arrive.
///
/// Text fragments come out in the order the service sent them. A
/// `requires_action` event dispatches the pending tool calls, submits their
/// outputs and drains the continuation stream in place before the outer
/// stream resumes.
#[derive(Clone)]
pub struct StreamProcessor {
    service: Arc<dyn ConversationService>,
    dispatcher: ToolDispatcher,
    max_tool_rounds: usize,
}

impl StreamProcessor {
    pub fn new(
        service: Arc<dyn ConversationService>,
        dispatcher: ToolDispatcher,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            service,
            dispatcher,
            max_tool_rounds,
        }
    }

    /// Lazily process `events` for a run on `thread_id`.
    ///
    /// Nothing is read from `events` until the returned stream is polled.
    /// The stream ends after `thread.run.completed` or when `events` ends;
    /// failure events, tool submission errors and transport errors are
    /// yielded as the stream's final item.
    pub fn process(&self, thread_id: impl Into<String>, events: EventStream) -> TextStream {
        self.clone().process_round(thread_id.into(), events, 0)
    }

    fn process_round(self, thread_id: String, events: EventStream, round: usize) -> TextStream {
        Box::pin(try_stream! {
            let mut events = events;
            while let Some(event) = events.next().await {
                match event? {
                    StreamEvent::MessageDelta(delta) => {
                        for fragment in delta.text_fragments() {
                            yield fragment.to_string();
                        }
                    }
                    StreamEvent::RunRequiresAction(run) => {
                        if round >= self.max_tool_rounds {
                            Err::<(), _>(ThreadrunError::ToolRoundLimit {
                                run_id: run.id.clone(),
                                limit: self.max_tool_rounds,
                            })?;
                        }
                        let continuation = self.answer_tool_calls(&thread_id, &run).await?;
                        let mut nested = self.clone().process_round(thread_id.clone(), continuation, round + 1);
                        while let Some(fragment) = nested.next().await {
                            yield fragment?;
                        }
                    }
                    StreamEvent::RunCompleted(run) => {
                        info!(run_id = %run.id, thread_id = %thread_id, "run completed");
                        break;
                    }
                    StreamEvent::RunFailed(run) => Err::<(), _>(run_failure(run, RUN_FAILED))?,
                    StreamEvent::RunCancelling(run) => Err::<(), _>(run_failure(run, RUN_CANCELLING))?,
                    StreamEvent::RunCancelled(run) => Err::<(), _>(run_failure(run, RUN_CANCELLED))?,
                    StreamEvent::RunExpired(run) => Err::<(), _>(run_failure(run, RUN_EXPIRED))?,
                    StreamEvent::RunStepFailed(step) => Err::<(), _>(step_failure(step, RUN_STEP_FAILED))?,
                    StreamEvent::RunStepCancelled(step) => {
                        Err::<(), _>(step_failure(step, RUN_STEP_CANCELLED))?
                    }
                    StreamEvent::Other { event } => {
                        debug!(event = %event, "ignoring stream event");
                    }
                }
            }
        })
    }

    /// Dispatch the run's tool calls and open the continuation stream.
    async fn answer_tool_calls(&self, thread_id: &str, run: &Run) -> Result<EventStream, ThreadrunError> {
        let ctx = ToolExecutionContext {
            tool_call_id: None,
            run_id: Some(run.id.clone()),
            thread_id: Some(thread_id.to_string()),
        };
        let results = self
            .dispatcher
            .dispatch_action(run.required_action.as_ref(), &ctx)
            .await;
        let outputs = to_outputs(results);
        info!(run_id = %run.id, outputs = outputs.len(), "submitting tool outputs");
        self.service
            .submit_tool_outputs_stream(thread_id, &run.id, outputs)
            .await
    }
}

impl std::fmt::Debug for StreamProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamProcessor")
            .field("dispatcher", &self.dispatcher)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .finish_non_exhaustive()
    }
}

fn run_failure(run: Run, event: &str) -> ThreadrunError {
    let reason = run.last_error.map(|e| format!("{}: {}", e.code, e.message));
    warn!(run_id = %run.id, event, reason = ?reason, "run ended without completing");
    ThreadrunError::RunFailed {
        run_id: run.id,
        event: event.to_string(),
        reason,
    }
}

fn step_failure(step: RunStep, event: &str) -> ThreadrunError {
    let reason = step.last_error.map(|e| format!("{}: {}", e.code, e.message));
    warn!(run_id = %step.run_id, step_id = %step.id, event, reason = ?reason, "run step ended without completing");
    ThreadrunError::RunFailed {
        run_id: step.run_id,
        event: event.to_string(),
        reason,
    }
}
