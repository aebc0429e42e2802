//! Threadrun: run-lifecycle orchestration for tool-using assistants.
//!
//! Holds a multi-turn conversation on a remote assistants service: each turn
//! clears stale runs off the thread, starts a new streaming run, answers the
//! tool calls it makes and yields the reply as a lazy stream of text.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use futures::StreamExt;
//! use threadrun::prelude::*;
//! use threadrun::tools::builtin::python_interpreter_tool;
//!
//! # async fn example() -> threadrun::error::Result<()> {
//! let config = ThreadrunConfig::load()?;
//! let service: Arc<dyn ConversationService> =
//!     Arc::new(OpenAiAssistantsService::from_config(&config)?);
//! let registry = Arc::new(ToolRegistry::builder().register(python_interpreter_tool()).build()?);
//!
//! let assistant = setup_assistant(service.clone(), &config.assistant, &registry).await?;
//! let session = Session::start(service, &assistant, registry, &config.runs).await?;
//!
//! let mut reply = session.send("What is 2 + 2?").await?;
//! while let Some(fragment) = reply.next().await {
//!     print!("{}", fragment?);
//! }
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod assistant;
pub mod chain;
pub mod config;
pub mod error;
pub mod prelude;
pub mod run;
pub mod service;
pub mod session;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
