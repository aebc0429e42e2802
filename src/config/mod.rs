//! Configuration system (layered: defaults < TOML file < environment).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ThreadrunError;

const CONFIG_FILE_NAME: &str = "threadrun.toml";
const DEFAULT_ASSISTANT_NAME: &str = "Data Engineer";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_INSTRUCTIONS: &str = "You're a senior data analyst. When asked for data information, write and run Python code to answer the question";
const DEFAULT_VECTOR_STORE_FILE: &str = "vector_store_id.txt";
const DEFAULT_CANCEL_BACKOFF_MS: u64 = 2_000;
const DEFAULT_CANCEL_BUDGET_MS: u64 = 120_000;
const DEFAULT_MAX_TOOL_ROUNDS: usize = 16;

/// Top-level configuration.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThreadrunConfig {
    api_key: Option<String>,
    base_url: Option<String>,
    pub assistant: AssistantConfig,
    pub runs: RunConfig,
}

impl std::fmt::Debug for ThreadrunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadrunConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("base_url", &self.base_url)
            .field("assistant", &self.assistant)
            .field("runs", &self.runs)
            .finish()
    }
}

/// How the assistant is looked up and configured at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssistantConfig {
    pub name: String,
    pub model: String,
    pub instructions: String,
    /// Attach the built-in `file_search` tool.
    pub file_search: bool,
    /// Text file holding the id of a pre-provisioned vector store.
    pub vector_store_file: PathBuf,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ASSISTANT_NAME.to_string(),
            model: DEFAULT_MODEL.to_string(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            file_search: true,
            vector_store_file: PathBuf::from(DEFAULT_VECTOR_STORE_FILE),
        }
    }
}

/// Time budgets and limits for run orchestration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub cancel_backoff_ms: u64,
    pub cancel_budget_ms: u64,
    pub max_tool_rounds: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cancel_backoff_ms: DEFAULT_CANCEL_BACKOFF_MS,
            cancel_budget_ms: DEFAULT_CANCEL_BUDGET_MS,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }
}

impl RunConfig {
    pub fn cancel_backoff(&self) -> Duration {
        Duration::from_millis(self.cancel_backoff_ms)
    }

    pub fn cancel_budget(&self) -> Duration {
        Duration::from_millis(self.cancel_budget_ms)
    }
}

impl Default for ThreadrunConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            assistant: AssistantConfig::default(),
            runs: RunConfig::default(),
        }
    }
}

impl ThreadrunConfig {
    /// Defaults, then the first config file found, then the environment.
    pub fn load() -> Result<Self, ThreadrunError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = match default_config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ThreadrunError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw).map_err(|e| {
            ThreadrunError::Configuration(format!("{}: {e}", path.display()))
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ThreadrunError> {
        toml::from_str(raw).map_err(|e| ThreadrunError::Configuration(e.to_string()))
    }

    /// Overlay environment values read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = non_empty(lookup("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(url) = non_empty(lookup("OPENAI_BASE_URL")) {
            self.base_url = Some(url);
        }
        if let Some(name) = non_empty(lookup("THREADRUN_ASSISTANT_NAME")) {
            self.assistant.name = name;
        }
        if let Some(model) = non_empty(lookup("THREADRUN_MODEL")) {
            self.assistant.model = model;
        }
        if let Some(instructions) = non_empty(lookup("THREADRUN_INSTRUCTIONS")) {
            self.assistant.instructions = instructions;
        }
        if let Some(path) = non_empty(lookup("THREADRUN_VECTOR_STORE_FILE")) {
            self.assistant.vector_store_file = PathBuf::from(path);
        }
        if let Some(value) = lookup("THREADRUN_FILE_SEARCH") {
            match value.trim() {
                "0" | "false" | "off" => self.assistant.file_search = false,
                "1" | "true" | "on" => self.assistant.file_search = true,
                _ => {}
            }
        }
        if let Some(ms) = lookup("THREADRUN_CANCEL_BACKOFF_MS").and_then(|v| parse_positive(&v)) {
            self.runs.cancel_backoff_ms = ms;
        }
        if let Some(ms) = lookup("THREADRUN_CANCEL_BUDGET_MS").and_then(|v| parse_positive(&v)) {
            self.runs.cancel_budget_ms = ms;
        }
        if let Some(rounds) = lookup("THREADRUN_MAX_TOOL_ROUNDS").and_then(|v| parse_positive(&v))
        {
            self.runs.max_tool_rounds = rounds as usize;
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(&self) -> Option<String> {
        self.api_key.clone()
    }

    pub fn base_url(&self) -> Option<String> {
        self.base_url.clone()
    }
}

/// Read a vector store id from a text file (surrounding whitespace ignored).
pub fn read_vector_store_id(path: &Path) -> Result<String, ThreadrunError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ThreadrunError::Configuration(format!(
            "cannot read vector store id from {}: {e}",
            path.display()
        ))
    })?;
    let id = raw.trim();
    if id.is_empty() {
        return Err(ThreadrunError::Configuration(format!(
            "vector store id file {} is empty",
            path.display()
        )));
    }
    Ok(id.to_string())
}

/// `./threadrun.toml`, else the platform config dir, if either exists.
fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    directories::ProjectDirs::from("", "", "threadrun")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_positive(value: &str) -> Option<u64> {
    let parsed = value.trim().parse::<u64>().ok()?;
    if parsed == 0 {
        None
    } else {
        Some(parsed)
    }
}
