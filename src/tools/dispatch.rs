//! Concurrent execution of the tool calls a paused run is waiting on.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future;
use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::registry::ToolRegistry;
use super::tool::ToolExecutionContext;
use crate::error::ThreadrunError;
use crate::types::{RequiredAction, ToolCall, ToolOutput};

/// Fans tool calls out to registered tools.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Run every call concurrently and map call id to output.
    ///
    /// Calls that are not function calls get no entry. Unknown tools, bad
    /// arguments and tool errors yield an empty string for that call only.
    /// No per-call timeout is applied.
    pub async fn dispatch(&self, calls: &[ToolCall], ctx: &ToolExecutionContext) -> HashMap<String, String> {
        let futures = calls.iter().map(|call| self.dispatch_one(call, ctx));
        future::join_all(futures)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Dispatch whatever a run's `required_action` asks for.
    ///
    /// Anything other than `submit_tool_outputs` yields an empty map.
    pub async fn dispatch_action(
        &self,
        action: Option<&RequiredAction>,
        ctx: &ToolExecutionContext,
    ) -> HashMap<String, String> {
        match action {
            Some(RequiredAction::SubmitToolOutputs { submit_tool_outputs }) => {
                self.dispatch(&submit_tool_outputs.tool_calls, ctx).await
            }
            Some(RequiredAction::Unsupported) | None => {
                warn!(run_id = ?ctx.run_id, "run requires an unsupported action");
                HashMap::new()
            }
        }
    }

    async fn dispatch_one(&self, call: &ToolCall, ctx: &ToolExecutionContext) -> Option<(String, String)> {
        let Some(function) = call.function.as_ref().filter(|_| call.is_function()) else {
            debug!(tool_call_id = %call.id, kind = %call.kind, "skipping non-function tool call");
            return None;
        };

        let mut call_ctx = ctx.clone();
        call_ctx.tool_call_id = Some(call.id.clone());

        let output = match self.invoke(&function.name, &function.arguments, &call_ctx).await {
            Ok(output) => output,
            Err(err) => {
                warn!(
                    tool = %function.name,
                    tool_call_id = %call.id,
                    error = %err,
                    "tool call failed, submitting empty output"
                );
                String::new()
            }
        };
        Some((call.id.clone(), output))
    }

    async fn invoke(
        &self,
        name: &str,
        raw_arguments: &str,
        ctx: &ToolExecutionContext,
    ) -> Result<String, ThreadrunError> {
        let tool = self.registry.get(name).ok_or_else(|| ThreadrunError::ToolExecution {
            tool_name: name.to_string(),
            message: "unknown tool".to_string(),
        })?;
        let args = ToolArguments::parse(raw_arguments)?;
        debug!(tool = %name, tool_call_id = ?ctx.tool_call_id, "executing tool");
        let value = tool.execute(&args, ctx).await?;
        Ok(render_output(value))
    }
}

/// Pair each output with its call id for resubmission.
pub fn to_outputs(results: HashMap<String, String>) -> Vec<ToolOutput> {
    results
        .into_iter()
        .map(|(tool_call_id, output)| ToolOutput {
            tool_call_id,
            output,
        })
        .collect()
}

/// JSON strings are submitted verbatim, anything else as compact JSON.
fn render_output(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tool::AgentTool;
    use crate::tools::types::ToolParameters;
    use crate::types::{SubmitToolOutputs, ToolCall};
    use pretty_assertions::assert_eq;

    fn dispatcher() -> ToolDispatcher {
        let echo = AgentTool::new(
            "echo",
            "Echo text",
            ToolParameters::object().string("text", "Text", true).build(),
            |args, _ctx| async move { Ok(serde_json::json!(args.get_str("text")?)) },
        );
        let sum = AgentTool::new(
            "sum",
            "Add numbers",
            ToolParameters::empty(),
            |args, _ctx| async move {
                let a = args.get_i64("a")?;
                let b = args.get_i64("b")?;
                Ok(serde_json::json!({ "total": a + b }))
            },
        );
        let broken = AgentTool::new("broken", "Always fails", ToolParameters::empty(), |_args, _ctx| async {
            Err(ThreadrunError::ToolExecution {
                tool_name: "broken".into(),
                message: "boom".into(),
            })
        });
        let registry = ToolRegistry::builder()
            .register(Arc::new(echo))
            .register(Arc::new(sum))
            .register(Arc::new(broken))
            .build()
            .unwrap();
        ToolDispatcher::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn failing_tool_does_not_abort_batch() {
        let calls = vec![
            ToolCall::function("call_1", "echo", r#"{"text":"hi"}"#),
            ToolCall::function("call_2", "broken", "{}"),
        ];
        let results = dispatcher().dispatch(&calls, &ToolExecutionContext::default()).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results["call_1"], "hi");
        assert_eq!(results["call_2"], "");
    }

    #[tokio::test]
    async fn unknown_tool_and_bad_arguments_yield_empty_output() {
        let calls = vec![
            ToolCall::function("call_1", "nope", "{}"),
            ToolCall::function("call_2", "echo", "{not json"),
        ];
        let results = dispatcher().dispatch(&calls, &ToolExecutionContext::default()).await;
        assert_eq!(results["call_1"], "");
        assert_eq!(results["call_2"], "");
    }

    #[tokio::test]
    async fn non_function_calls_are_dropped() {
        let mut call = ToolCall::function("call_1", "echo", r#"{"text":"hi"}"#);
        call.kind = "code_interpreter".into();
        let results = dispatcher().dispatch(&[call], &ToolExecutionContext::default()).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn structured_values_render_as_json() {
        let calls = vec![ToolCall::function("call_1", "sum", r#"{"a":2,"b":2}"#)];
        let results = dispatcher().dispatch(&calls, &ToolExecutionContext::default()).await;
        assert_eq!(results["call_1"], r#"{"total":4}"#);
    }

    #[tokio::test]
    async fn unsupported_action_yields_nothing() {
        let d = dispatcher();
        let ctx = ToolExecutionContext::default();
        assert!(d.dispatch_action(None, &ctx).await.is_empty());
        assert!(d
            .dispatch_action(Some(&RequiredAction::Unsupported), &ctx)
            .await
            .is_empty());

        let action = RequiredAction::SubmitToolOutputs {
            submit_tool_outputs: SubmitToolOutputs {
                tool_calls: vec![ToolCall::function("call_9", "echo", r#"{"text":"ok"}"#)],
            },
        };
        let results = d.dispatch_action(Some(&action), &ctx).await;
        assert_eq!(results["call_9"], "ok");
    }

    #[test]
    fn outputs_carry_call_ids() {
        let mut results = HashMap::new();
        results.insert("call_1".to_string(), "4".to_string());
        let outputs = to_outputs(results);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].tool_call_id, "call_1");
        assert_eq!(outputs[0].output, "4");
    }
}
