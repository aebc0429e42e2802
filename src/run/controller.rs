//! Starting a run for each user turn.

use std::sync::Arc;

use tracing::info;

use super::cancel::{CancelPolicy, CancellationCoordinator};
use super::stream::StreamProcessor;
use super::TextStream;
use crate::config::RunConfig;
use crate::error::ThreadrunError;
use crate::service::ConversationService;
use crate::tools::{ToolDispatcher, ToolRegistry};
use crate::types::Role;

/// Entry point for one conversational turn.
#[derive(Clone)]
pub struct RunController {
    assistant_id: String,
    coordinator: CancellationCoordinator,
    processor: StreamProcessor,
    service: Arc<dyn ConversationService>,
}

impl RunController {
    pub fn new(
        service: Arc<dyn ConversationService>,
        assistant_id: impl Into<String>,
        registry: Arc<ToolRegistry>,
        config: &RunConfig,
    ) -> Self {
        let coordinator = CancellationCoordinator::new(service.clone(), CancelPolicy::from(config));
        let processor = StreamProcessor::new(
            service.clone(),
            ToolDispatcher::new(registry),
            config.max_tool_rounds,
        );
        Self {
            assistant_id: assistant_id.into(),
            coordinator,
            processor,
            service,
        }
    }

    /// Clear stale runs, post `text`, start a run and stream its reply.
    ///
    /// Fails without posting anything if stale runs could not be cleared.
    /// Each successful call creates exactly one message and one run.
    pub async fn send(&self, thread_id: &str, text: &str) -> Result<TextStream, ThreadrunError> {
        self.coordinator.cancel_active_runs(thread_id).await?;

        let message = self.service.create_message(thread_id, Role::User, text).await?;
        info!(thread_id, message_id = %message.id, "posted user message");

        let events = self
            .service
            .create_run_stream(thread_id, &self.assistant_id)
            .await?;
        info!(thread_id, assistant_id = %self.assistant_id, "run started");

        Ok(self.processor.process(thread_id, events))
    }
}

impl std::fmt::Debug for RunController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunController")
            .field("assistant_id", &self.assistant_id)
            .field("coordinator", &self.coordinator)
            .field("processor", &self.processor)
            .finish_non_exhaustive()
    }
}
