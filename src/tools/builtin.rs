//! Built-in `python_interpreter` tool.
//!
//! Evaluates the `py_code` argument in a fresh `python3` process. A single
//! expression returns its value; anything else is executed as statements and
//! returns whatever it printed.
//!
//! ```rust,no_run
//! use threadrun::tools::{builtin::python_interpreter_tool, ToolRegistry};
//!
//! let registry = ToolRegistry::builder()
//!     .register(python_interpreter_tool())
//!     .build()
//!     .unwrap();
//! assert_eq!(registry.len(), 1);
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ThreadrunError;
use crate::tools::arguments::ToolArguments;
use crate::tools::tool::{Tool, ToolExecutionContext};
use crate::tools::types::ToolParameters;

pub const PYTHON_INTERPRETER: &str = "python_interpreter";

const OUTPUT_MAX_BYTES: usize = 32_768;
const EXECUTION_TIMEOUT: Duration = Duration::from_secs(30);
const NO_OUTPUT: &str = "Code executed successfully";

/// Evaluates an expression if the source parses as one, else executes it.
const RUNNER: &str = r#"import sys
src = sys.argv[1]
try:
    code = compile(src, "<py_code>", "eval")
except SyntaxError:
    exec(compile(src, "<py_code>", "exec"), {"__name__": "__main__"})
else:
    value = eval(code, {"__name__": "__main__"})
    if value is not None:
        print(value)
"#;

fn truncate_utf8(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }

    let mut cutoff = max_bytes;
    while cutoff > 0 && !s.is_char_boundary(cutoff) {
        cutoff -= 1;
    }
    format!("{}\n... (truncated)", &s[..cutoff])
}

/// Python code execution in a child process.
#[derive(Debug, Clone)]
pub struct PythonInterpreterTool {
    program: String,
    timeout: Duration,
    parameters: ToolParameters,
}

impl PythonInterpreterTool {
    pub fn new() -> Self {
        Self::with_program("python3")
    }

    /// Use a specific interpreter binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: EXECUTION_TIMEOUT,
            parameters: ToolParameters::object()
                .string("py_code", "The Python code to execute", true)
                .build(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn failure(&self, message: impl Into<String>) -> ThreadrunError {
        ThreadrunError::ToolExecution {
            tool_name: PYTHON_INTERPRETER.into(),
            message: message.into(),
        }
    }
}

impl Default for PythonInterpreterTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for PythonInterpreterTool {
    fn name(&self) -> &str {
        PYTHON_INTERPRETER
    }

    fn description(&self) -> &str {
        "Executes Python code and returns the result or error message."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, ThreadrunError> {
        let code = args.get_str("py_code")?;
        debug!(tool_call_id = ?ctx.tool_call_id, bytes = code.len(), "running python code");

        let result = tokio::time::timeout(
            self.timeout,
            tokio::process::Command::new(&self.program)
                .arg("-c")
                .arg(RUNNER)
                .arg(code)
                .kill_on_drop(true)
                .output(),
        )
        .await;

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(self.failure(format!("{}: {e}", self.program))),
            Err(_) => {
                return Err(self.failure(format!(
                    "code timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
        };

        let text = if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stdout = stdout.trim_end();
            if stdout.is_empty() {
                NO_OUTPUT.to_string()
            } else {
                stdout.to_string()
            }
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("process exited with an error");
            format!("Error while executing code: {detail}")
        };

        Ok(serde_json::Value::String(truncate_utf8(&text, OUTPUT_MAX_BYTES)))
    }
}

/// The default interpreter tool, ready to register.
pub fn python_interpreter_tool() -> Arc<dyn Tool> {
    Arc::new(PythonInterpreterTool::new())
}
