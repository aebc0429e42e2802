//! Tests for the tool system.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use threadrun::error::ThreadrunError;
use threadrun::tools::*;
use threadrun::types::ToolCall;

fn greet_tool() -> AgentTool {
    AgentTool::new(
        "greet",
        "Greet a person",
        ToolParameters::object().string("name", "Name", true).build(),
        |args, ctx| async move {
            let name = args.get_str("name")?;
            Ok(serde_json::json!({
                "greeting": format!("Hello, {name}!"),
                "call": ctx.tool_call_id,
            }))
        },
    )
}

#[tokio::test]
async fn agent_tool_executes() {
    let tool = greet_tool();

    assert_eq!(tool.name(), "greet");
    assert_eq!(tool.description(), "Greet a person");

    let args = ToolArguments::new(serde_json::json!({"name": "World"}));
    let result = tool
        .execute(&args, &ToolExecutionContext::default())
        .await
        .unwrap();
    assert_eq!(result["greeting"], "Hello, World!");
}

#[test]
fn function_spec_matches_assistant_format() {
    let spec = greet_tool().function_spec();
    assert_eq!(
        spec,
        serde_json::json!({
            "type": "function",
            "function": {
                "name": "greet",
                "description": "Greet a person",
                "parameters": {
                    "type": "object",
                    "properties": { "name": { "type": "string", "description": "Name" } },
                    "required": ["name"],
                }
            }
        })
    );
}

#[tokio::test]
async fn dispatcher_passes_call_id_to_tool() {
    let registry = ToolRegistry::builder()
        .register(Arc::new(greet_tool()))
        .build()
        .unwrap();
    let dispatcher = ToolDispatcher::new(Arc::new(registry));

    let calls = vec![ToolCall::function("call_7", "greet", r#"{"name":"Ada"}"#)];
    let results = dispatcher
        .dispatch(&calls, &ToolExecutionContext::default())
        .await;

    let output: serde_json::Value = serde_json::from_str(&results["call_7"]).unwrap();
    assert_eq!(output["greeting"], "Hello, Ada!");
    assert_eq!(output["call"], "call_7");
}

#[tokio::test]
async fn dispatch_runs_calls_concurrently() {
    let slow = AgentTool::new("slow", "Sleeps", ToolParameters::empty(), |_args, _ctx| async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(serde_json::json!("done"))
    });
    let registry = ToolRegistry::builder().register(Arc::new(slow)).build().unwrap();
    let dispatcher = ToolDispatcher::new(Arc::new(registry));
    let calls: Vec<ToolCall> = (0..5)
        .map(|i| ToolCall::function(format!("call_{i}"), "slow", "{}"))
        .collect();

    let started = tokio::time::Instant::now();
    let results = dispatcher
        .dispatch(&calls, &ToolExecutionContext::default())
        .await;

    assert_eq!(results.len(), 5);
    assert!(results.values().all(|v| v == "done"));
    assert!(started.elapsed() < Duration::from_millis(800));
}

#[test]
fn tool_error_categories() {
    let err = ThreadrunError::ToolExecution {
        tool_name: "calc".into(),
        message: "bad".into(),
    };
    assert!(!err.is_retryable());
    assert_eq!(err.to_string(), "Tool execution error: calc: bad");
}
