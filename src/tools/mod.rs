//! Local tools the assistant can call, and their dispatch.

pub mod arguments;
pub mod builtin;
pub mod dispatch;
pub mod registry;
pub mod tool;
pub mod types;

pub use arguments::ToolArguments;
pub use dispatch::{to_outputs, ToolDispatcher};
pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use tool::{AgentTool, Tool, ToolExecutionContext};
pub use types::ToolParameters;
