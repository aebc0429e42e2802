//! Clearing stale runs off a thread before a new one starts.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::ThreadrunError;
use crate::service::ConversationService;
use crate::types::RunStatus;

/// Polling interval and overall deadline for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelPolicy {
    /// Sleep between status polls of one run.
    pub backoff: Duration,
    /// Wall-clock budget shared by every per-run task.
    pub budget: Duration,
}

impl Default for CancelPolicy {
    fn default() -> Self {
        Self::from(&RunConfig::default())
    }
}

impl From<&RunConfig> for CancelPolicy {
    fn from(config: &RunConfig) -> Self {
        Self {
            backoff: config.cancel_backoff(),
            budget: config.cancel_budget(),
        }
    }
}

/// Cancels every non-terminal run on a thread, concurrently and within a budget.
#[derive(Clone)]
pub struct CancellationCoordinator {
    service: Arc<dyn ConversationService>,
    policy: CancelPolicy,
}

impl CancellationCoordinator {
    pub fn new(service: Arc<dyn ConversationService>, policy: CancelPolicy) -> Self {
        Self { service, policy }
    }

    /// Returns once no run on `thread_id` is active.
    ///
    /// A thread with no active runs is a no-op. Otherwise one task per run
    /// polls and cancels it; tasks still running when the budget expires are
    /// aborted. Any failed or aborted task fails the whole call with
    /// [`ThreadrunError::CancellationFailed`].
    pub async fn cancel_active_runs(&self, thread_id: &str) -> Result<(), ThreadrunError> {
        let active: Vec<String> = self
            .service
            .list_runs(thread_id)
            .await?
            .into_iter()
            .filter(|run| run.status.is_active())
            .map(|run| run.id)
            .collect();

        if active.is_empty() {
            debug!(thread_id, "no active runs");
            return Ok(());
        }
        info!(thread_id, count = active.len(), "cancelling active runs");

        let mut tasks = JoinSet::new();
        for run_id in active {
            let service = self.service.clone();
            let thread_id = thread_id.to_string();
            let backoff = self.policy.backoff;
            tasks.spawn(async move {
                let result = cancel_until_terminal(service.as_ref(), &thread_id, &run_id, backoff).await;
                (run_id, result)
            });
        }

        let deadline = Instant::now() + self.policy.budget;
        let mut failed = 0;
        let mut pending = 0;
        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(None) => break,
                Ok(Some(Ok((run_id, Ok(status))))) => {
                    debug!(thread_id, run_id = %run_id, status = %status, "run stopped");
                }
                Ok(Some(Ok((run_id, Err(err))))) => {
                    warn!(thread_id, run_id = %run_id, error = %err, "failed to cancel run");
                    failed += 1;
                }
                Ok(Some(Err(join_err))) => {
                    warn!(thread_id, error = %join_err, "cancellation task panicked");
                    failed += 1;
                }
                Err(_) => {
                    pending = tasks.len();
                    warn!(
                        thread_id,
                        pending,
                        budget_ms = self.policy.budget.as_millis() as u64,
                        "cancellation budget exhausted, aborting remaining tasks"
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        if failed > 0 || pending > 0 {
            return Err(ThreadrunError::CancellationFailed {
                thread_id: thread_id.to_string(),
                failed,
                pending,
            });
        }
        info!(thread_id, "active runs cleared");
        Ok(())
    }
}

impl std::fmt::Debug for CancellationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationCoordinator")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Poll one run, requesting cancellation until it reaches a terminal status.
async fn cancel_until_terminal(
    service: &dyn ConversationService,
    thread_id: &str,
    run_id: &str,
    backoff: Duration,
) -> Result<RunStatus, ThreadrunError> {
    loop {
        let status = service.retrieve_run(thread_id, run_id).await?.status;
        if status == RunStatus::Cancelling {
            debug!(run_id, "run is cancelling, waiting");
            tokio::time::sleep(backoff).await;
            continue;
        }
        if status.is_terminal() {
            return Ok(status);
        }

        let status = service.cancel_run(thread_id, run_id).await?.status;
        if status.ends_cancellation() {
            return Ok(status);
        }
        debug!(run_id, status = %status, "run not yet stopped");
        tokio::time::sleep(backoff).await;
    }
}
