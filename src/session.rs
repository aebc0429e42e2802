//! One conversation thread bound to a configured assistant.

use std::io::{ErrorKind, Write};
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};

use crate::config::RunConfig;
use crate::error::ThreadrunError;
use crate::run::{RunController, TextStream};
use crate::service::ConversationService;
use crate::tools::ToolRegistry;
use crate::types::{Assistant, Thread};

const PROMPT: &str = "\nYou (type 'exit' to quit): ";

/// Whether a line typed at the prompt ends the session.
pub fn is_exit_command(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit")
}

/// A live thread plus the controller that runs turns on it.
///
/// The thread is created by [`Session::start`] and deleted by
/// [`Session::close`]; dropping a session without closing it leaves the
/// thread on the service.
pub struct Session {
    thread: Thread,
    controller: RunController,
    service: Arc<dyn ConversationService>,
}

impl Session {
    pub async fn start(
        service: Arc<dyn ConversationService>,
        assistant: &Assistant,
        registry: Arc<ToolRegistry>,
        config: &RunConfig,
    ) -> Result<Self, ThreadrunError> {
        let thread = service.create_thread().await?;
        info!(thread_id = %thread.id, assistant_id = %assistant.id, "created thread");
        let controller = RunController::new(service.clone(), assistant.id.clone(), registry, config);
        Ok(Self {
            thread,
            controller,
            service,
        })
    }

    pub fn thread_id(&self) -> &str {
        &self.thread.id
    }

    /// Send one user turn and stream the assistant's reply.
    pub async fn send(&self, text: &str) -> Result<TextStream, ThreadrunError> {
        self.controller.send(&self.thread.id, text).await
    }

    /// Interactive loop: read user lines from `input`, stream replies to `out`.
    ///
    /// A failed turn or an undecodable input line is logged and the loop
    /// continues. End of input, an exit command or a broken input or output
    /// stream ends it. The thread is deleted however the loop ends.
    pub async fn converse<R, W>(self, input: R, out: &mut W) -> Result<(), ThreadrunError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        loop {
            if let Err(e) = write!(out, "{PROMPT}").and_then(|()| out.flush()) {
                error!(error = %e, "cannot write prompt");
                break;
            }

            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    error!(error = %e, "skipping unreadable input line");
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "cannot read input");
                    break;
                }
            };
            if is_exit_command(&line) {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            if let Err(e) = self.reply(&line, out).await {
                error!(error = %e, category = ?e.category(), retryable = e.is_retryable(), "turn failed");
            }
        }

        info!(thread_id = self.thread_id(), "ending session");
        self.close().await
    }

    /// Write each fragment of the reply as soon as it arrives.
    async fn reply<W: Write>(&self, text: &str, out: &mut W) -> Result<(), ThreadrunError> {
        let mut fragments = self.send(text).await?;
        while let Some(fragment) = fragments.next().await {
            write!(out, "{}", fragment?)?;
            out.flush()?;
        }
        writeln!(out)?;
        Ok(())
    }

    /// Delete the thread.
    pub async fn close(self) -> Result<(), ThreadrunError> {
        let status = self.service.delete_thread(&self.thread.id).await?;
        if status.deleted {
            info!(thread_id = %status.id, "deleted thread");
        } else {
            warn!(thread_id = %status.id, "service did not delete thread");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("thread", &self.thread)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("  QUIT \n"));
        assert!(!is_exit_command("exit now"));
    }
}
