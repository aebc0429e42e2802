//! CLI entry point for threadrun.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ThreadrunConfig;

/// Threadrun CLI
#[derive(Parser, Debug)]
#[command(name = "threadrun", version, about = "Chat with a tool-using assistant")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive conversation
    Chat(ChatArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug, Default)]
pub struct ChatArgs {
    /// Assistant to look up (created if missing)
    #[arg(long)]
    pub assistant_name: Option<String>,

    /// Model for a newly created assistant
    #[arg(short, long)]
    pub model: Option<String>,

    /// Assistant instructions
    #[arg(short, long)]
    pub instructions: Option<String>,

    /// File holding the vector store id for file search
    #[arg(long)]
    pub vector_store_file: Option<PathBuf>,

    /// Do not attach the file_search tool
    #[arg(long)]
    pub no_file_search: bool,
}

impl ChatArgs {
    /// Overlay the flags that were given onto `config`.
    pub fn apply_to(&self, config: &mut ThreadrunConfig) {
        if let Some(name) = &self.assistant_name {
            config.assistant.name = name.clone();
        }
        if let Some(model) = &self.model {
            config.assistant.model = model.clone();
        }
        if let Some(instructions) = &self.instructions {
            config.assistant.instructions = instructions.clone();
        }
        if let Some(path) = &self.vector_store_file {
            config.assistant.vector_store_file = path.clone();
        }
        if self.no_file_search {
            config.assistant.file_search = false;
        }
    }
}
