//! Conversation service trait and the HTTP implementation.

pub mod http;
pub mod openai;

pub use openai::OpenAiAssistantsService;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::ThreadrunError;
use crate::types::{
    Assistant, AssistantPatch, AssistantSpec, DeletionStatus, Role, Run, StreamEvent, Thread,
    ThreadMessage, ToolOutput,
};

/// Live events of one run, in the order the service sent them.
pub type EventStream = BoxStream<'static, Result<StreamEvent, ThreadrunError>>;

/// Remote service hosting threads, runs and assistants.
///
/// Every method is a network round-trip; none of them retry.
#[async_trait]
pub trait ConversationService: Send + Sync {
    async fn create_thread(&self) -> Result<Thread, ThreadrunError>;

    async fn delete_thread(&self, thread_id: &str) -> Result<DeletionStatus, ThreadrunError>;

    async fn create_message(
        &self,
        thread_id: &str,
        role: Role,
        content: &str,
    ) -> Result<ThreadMessage, ThreadrunError>;

    /// Start a run and stream its events.
    async fn create_run_stream(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<EventStream, ThreadrunError>;

    /// All runs on the thread, newest first.
    async fn list_runs(&self, thread_id: &str) -> Result<Vec<Run>, ThreadrunError>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ThreadrunError>;

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ThreadrunError>;

    /// Submit tool outputs for a paused run and stream the continuation.
    async fn submit_tool_outputs_stream(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<EventStream, ThreadrunError>;

    async fn find_assistant_by_name(&self, name: &str)
        -> Result<Option<Assistant>, ThreadrunError>;

    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<Assistant, ThreadrunError>;

    async fn update_assistant(
        &self,
        assistant_id: &str,
        patch: &AssistantPatch,
    ) -> Result<Assistant, ThreadrunError>;
}
