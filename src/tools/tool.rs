//! Locally executed function tools answering a run's `requires_action`.
//!
//! The assistant only sees a tool's function spec; the run pauses until the
//! dispatcher has executed every requested call and submitted one output
//! string per call id.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::arguments::ToolArguments;
use super::types::{function_spec, ToolParameters};
use crate::error::ThreadrunError;

/// Where a tool call came from.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionContext {
    /// Tool call id assigned by the service.
    pub tool_call_id: Option<String>,
    /// Run that requested the call.
    pub run_id: Option<String>,
    /// Thread the run belongs to.
    pub thread_id: Option<String>,
}

/// A function tool registered with the assistant and executed in-process.
///
/// A returned JSON string is submitted verbatim, any other value as compact
/// JSON. An `Err` does not fail the run: the dispatcher logs it and submits
/// an empty output for that call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Function name; must be unique within a registry.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters(&self) -> &ToolParameters;

    /// Answer one call. `args` are the call's decoded `arguments`.
    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, ThreadrunError>;

    /// `{"type": "function", ...}` entry for the assistant's `tools` list.
    fn function_spec(&self) -> serde_json::Value {
        function_spec(self.name(), self.description(), self.parameters())
    }
}

type ToolHandler = dyn Fn(
        ToolArguments,
        ToolExecutionContext,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ThreadrunError>> + Send>>
    + Send
    + Sync;

/// A function tool backed by an async closure.
///
/// ```rust
/// use threadrun::tools::{AgentTool, Tool, ToolParameters};
///
/// let shout = AgentTool::new(
///     "shout",
///     "Upper-case some text",
///     ToolParameters::object().string("text", "Text", true).build(),
///     |args, _ctx| async move { Ok(serde_json::json!(args.get_str("text")?.to_uppercase())) },
/// );
/// assert_eq!(shout.function_spec()["function"]["name"], "shout");
/// ```
pub struct AgentTool {
    name: String,
    description: String,
    parameters: ToolParameters,
    handler: Arc<ToolHandler>,
}

impl AgentTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, ThreadrunError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, ThreadrunError> {
        let output = (self.handler)(args.clone(), ctx.clone()).await;
        if let Err(e) = &output {
            debug!(tool = %self.name, tool_call_id = ?ctx.tool_call_id, error = %e, "tool handler failed");
        }
        output
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}
