//! Shared test helpers and a scripted in-memory conversation service.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;

use threadrun::error::ThreadrunError;
use threadrun::service::{ConversationService, EventStream};
use threadrun::types::*;

/// How a run reacts to cancel requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelBehavior {
    /// The cancel response is already `cancelled`.
    Immediate,
    /// The cancel response is `cancelling`; the next poll sees `cancelled`.
    Gradual,
    /// Cancel is accepted but the run never leaves its status.
    Stuck,
    /// The cancel request fails.
    Reject,
}

/// Every call the mock received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateThread,
    DeleteThread(String),
    CreateMessage(String),
    CreateRun,
    ListRuns,
    RetrieveRun(String),
    CancelRun(String),
    SubmitToolOutputs { run_id: String, outputs: Vec<ToolOutput> },
    FindAssistant(String),
    CreateAssistant(String),
    UpdateAssistant(String),
}

/// Events a newly created run (or a tool-output submission) streams back.
pub struct ScriptedStream {
    run_id: String,
    events: Vec<Result<StreamEvent, ThreadrunError>>,
    /// Status the run holds once the stream has been created.
    final_status: RunStatus,
}

impl ScriptedStream {
    pub fn new(run_id: &str, events: Vec<StreamEvent>) -> Self {
        Self {
            run_id: run_id.to_string(),
            events: events.into_iter().map(Ok).collect(),
            final_status: RunStatus::Completed,
        }
    }

    /// Append a transport error after the scripted events.
    pub fn then_error(mut self, err: ThreadrunError) -> Self {
        self.events.push(Err(err));
        self
    }

    /// Leave the run in `status` (e.g. a run abandoned mid-stream).
    pub fn leaving(mut self, status: RunStatus) -> Self {
        self.final_status = status;
        self
    }
}

struct MockRun {
    run: Run,
    cancel: CancelBehavior,
}

#[derive(Default)]
struct State {
    thread_counter: usize,
    runs: Vec<MockRun>,
    run_streams: VecDeque<ScriptedStream>,
    submit_streams: VecDeque<ScriptedStream>,
    assistants: Vec<Assistant>,
    calls: Vec<Call>,
}

/// A conversation service backed by scripted runs and streams.
#[derive(Default)]
pub struct MockService {
    state: Mutex<State>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a pre-existing run (e.g. a stale run left by an earlier session).
    pub fn add_run(&self, run_id: &str, status: RunStatus, cancel: CancelBehavior) {
        self.state.lock().unwrap().runs.push(MockRun {
            run: Run::new(run_id, status),
            cancel,
        });
    }

    /// Queue the stream returned by the next `create_run_stream`.
    pub fn queue_run(&self, stream: ScriptedStream) {
        self.state.lock().unwrap().run_streams.push_back(stream);
    }

    /// Queue the stream returned by the next `submit_tool_outputs_stream`.
    pub fn queue_submission(&self, stream: ScriptedStream) {
        self.state.lock().unwrap().submit_streams.push_back(stream);
    }

    pub fn add_assistant(&self, assistant: Assistant) {
        self.state.lock().unwrap().assistants.push(assistant);
    }

    pub fn assistants(&self) -> Vec<Assistant> {
        self.state.lock().unwrap().assistants.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn run_status(&self, run_id: &str) -> Option<RunStatus> {
        let state = self.state.lock().unwrap();
        state
            .runs
            .iter()
            .find(|r| r.run.id == run_id)
            .map(|r| r.run.status)
    }

    pub fn active_run_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.runs.iter().filter(|r| r.run.status.is_active()).count()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn open_stream(
        &self,
        stream: Option<ScriptedStream>,
        what: &str,
    ) -> Result<EventStream, ThreadrunError> {
        let stream = stream
            .ok_or_else(|| ThreadrunError::InvalidState(format!("no scripted stream for {what}")))?;
        let mut state = self.state.lock().unwrap();
        match state.runs.iter_mut().find(|r| r.run.id == stream.run_id) {
            Some(existing) => existing.run.status = stream.final_status,
            None => state.runs.push(MockRun {
                run: Run::new(&stream.run_id, stream.final_status),
                cancel: CancelBehavior::Immediate,
            }),
        }
        Ok(futures::stream::iter(stream.events).boxed())
    }
}

#[async_trait]
impl ConversationService for MockService {
    async fn create_thread(&self) -> Result<Thread, ThreadrunError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateThread);
        state.thread_counter += 1;
        Ok(Thread::new(format!("thread_{}", state.thread_counter)))
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<DeletionStatus, ThreadrunError> {
        self.record(Call::DeleteThread(thread_id.to_string()));
        Ok(DeletionStatus {
            id: thread_id.to_string(),
            deleted: true,
        })
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<ThreadMessage, ThreadrunError> {
        self.record(Call::CreateMessage(content.to_string()));
        let count = self.calls().len();
        Ok(ThreadMessage {
            id: format!("msg_{count}"),
            thread_id: Some(thread_id.to_string()),
            role,
        })
    }

    async fn create_run_stream(
        &self,
        _thread_id: &str,
        _assistant_id: &str,
    ) -> Result<EventStream, ThreadrunError> {
        self.record(Call::CreateRun);
        if self.active_run_count() > 0 {
            return Err(ThreadrunError::api(
                400,
                "Thread already has an active run".to_string(),
            ));
        }
        let next = self.state.lock().unwrap().run_streams.pop_front();
        self.open_stream(next, "create_run_stream")
    }

    async fn list_runs(&self, _thread_id: &str) -> Result<Vec<Run>, ThreadrunError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListRuns);
        Ok(state.runs.iter().rev().map(|r| r.run.clone()).collect())
    }

    async fn retrieve_run(&self, _thread_id: &str, run_id: &str) -> Result<Run, ThreadrunError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::RetrieveRun(run_id.to_string()));
        let entry = state
            .runs
            .iter_mut()
            .find(|r| r.run.id == run_id)
            .ok_or_else(|| ThreadrunError::api(404, format!("No run found with id '{run_id}'")))?;
        let snapshot = entry.run.clone();
        if entry.cancel == CancelBehavior::Gradual && entry.run.status == RunStatus::Cancelling {
            entry.run.status = RunStatus::Cancelled;
        }
        Ok(snapshot)
    }

    async fn cancel_run(&self, _thread_id: &str, run_id: &str) -> Result<Run, ThreadrunError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CancelRun(run_id.to_string()));
        let entry = state
            .runs
            .iter_mut()
            .find(|r| r.run.id == run_id)
            .ok_or_else(|| ThreadrunError::api(404, format!("No run found with id '{run_id}'")))?;
        match entry.cancel {
            CancelBehavior::Immediate => entry.run.status = RunStatus::Cancelled,
            CancelBehavior::Gradual => entry.run.status = RunStatus::Cancelling,
            CancelBehavior::Stuck => {}
            CancelBehavior::Reject => {
                return Err(ThreadrunError::api(500, "cancel failed".to_string()));
            }
        }
        Ok(entry.run.clone())
    }

    async fn submit_tool_outputs_stream(
        &self,
        _thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<EventStream, ThreadrunError> {
        let mut sorted = outputs;
        sorted.sort_by(|a, b| a.tool_call_id.cmp(&b.tool_call_id));
        self.record(Call::SubmitToolOutputs {
            run_id: run_id.to_string(),
            outputs: sorted,
        });
        let next = self.state.lock().unwrap().submit_streams.pop_front();
        self.open_stream(next, "submit_tool_outputs_stream")
    }

    async fn find_assistant_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Assistant>, ThreadrunError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::FindAssistant(name.to_string()));
        Ok(state
            .assistants
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .cloned())
    }

    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<Assistant, ThreadrunError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateAssistant(spec.name.clone()));
        let assistant = Assistant {
            id: format!("asst_{}", state.assistants.len() + 1),
            name: Some(spec.name.clone()),
            model: spec.model.clone(),
            instructions: spec.instructions.clone(),
            tools: Vec::new(),
            tool_resources: None,
        };
        state.assistants.push(assistant.clone());
        Ok(assistant)
    }

    async fn update_assistant(
        &self,
        assistant_id: &str,
        patch: &AssistantPatch,
    ) -> Result<Assistant, ThreadrunError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::UpdateAssistant(assistant_id.to_string()));
        let assistant = state
            .assistants
            .iter_mut()
            .find(|a| a.id == assistant_id)
            .ok_or_else(|| ThreadrunError::api(404, format!("No assistant found with id '{assistant_id}'")))?;
        if let Some(instructions) = &patch.instructions {
            assistant.instructions = Some(instructions.clone());
        }
        if let Some(tools) = &patch.tools {
            assistant.tools = tools.clone();
        }
        if let Some(resources) = &patch.tool_resources {
            assistant.tool_resources = Some(resources.clone());
        }
        Ok(assistant.clone())
    }
}

pub fn text(fragment: &str) -> StreamEvent {
    StreamEvent::text(fragment)
}

pub fn completed(run_id: &str) -> StreamEvent {
    StreamEvent::RunCompleted(Run::new(run_id, RunStatus::Completed))
}

pub fn requires_action(run_id: &str, calls: Vec<ToolCall>) -> StreamEvent {
    StreamEvent::RunRequiresAction(Run::new(run_id, RunStatus::RequiresAction).with_tool_calls(calls))
}

/// An event stream that yields `events` and ends.
pub fn scripted(events: Vec<StreamEvent>) -> EventStream {
    futures::stream::iter(events.into_iter().map(Ok)).boxed()
}

/// Drain a text stream, stopping at the first error.
pub async fn collect_text(
    mut stream: threadrun::run::TextStream,
) -> (Vec<String>, Option<ThreadrunError>) {
    let mut fragments = Vec::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(fragment) => fragments.push(fragment),
            Err(err) => return (fragments, Some(err)),
        }
    }
    (fragments, None)
}
