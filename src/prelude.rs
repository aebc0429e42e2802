//! Convenience re-exports for common use.

pub use crate::assistant::setup_assistant;
pub use crate::config::ThreadrunConfig;
pub use crate::error::{Result, ThreadrunError};
pub use crate::run::{RunController, TextStream};
pub use crate::service::{ConversationService, OpenAiAssistantsService};
pub use crate::session::Session;
pub use crate::tools::{AgentTool, Tool, ToolArguments, ToolParameters, ToolRegistry};
pub use crate::types::{Run, RunStatus, StreamEvent};
