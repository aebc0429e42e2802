//! Idempotent assistant setup.
//!
//! [`setup_assistant`] queues three steps on a [`DeferredChain`]: look the
//! assistant up by name (creating it if absent), replace its instructions,
//! then replace its tool list. Each step returns the updated builder so the
//! next one sees the latest remote snapshot.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::chain::DeferredChain;
use crate::config::{read_vector_store_id, AssistantConfig};
use crate::error::ThreadrunError;
use crate::service::ConversationService;
use crate::tools::types::{contains_file_search, file_search_spec};
use crate::tools::ToolRegistry;
use crate::types::{Assistant, AssistantPatch, AssistantSpec};

const PLACEHOLDER_INSTRUCTIONS: &str =
    "You are a helpful AI assistant who is adept at using tools to answer questions posed by users";

/// Current remote snapshot of the assistant being configured.
pub struct AssistantBuilder {
    service: Arc<dyn ConversationService>,
    vector_store_file: PathBuf,
    assistant: Option<Assistant>,
}

impl AssistantBuilder {
    pub fn new(service: Arc<dyn ConversationService>, vector_store_file: impl Into<PathBuf>) -> Self {
        Self {
            service,
            vector_store_file: vector_store_file.into(),
            assistant: None,
        }
    }

    pub fn assistant(&self) -> Option<&Assistant> {
        self.assistant.as_ref()
    }

    pub fn into_assistant(self) -> Result<Assistant, ThreadrunError> {
        self.assistant
            .ok_or_else(|| ThreadrunError::InvalidState("assistant was never resolved".into()))
    }

    fn assistant_id(&self) -> Result<&str, ThreadrunError> {
        self.assistant
            .as_ref()
            .map(|a| a.id.as_str())
            .ok_or_else(|| {
                ThreadrunError::InvalidState("get_or_create must run before updating".into())
            })
    }

    /// Reuse the assistant named `name`, or create one.
    pub async fn get_or_create(mut self, name: String, model: String) -> Result<Self, ThreadrunError> {
        let assistant = match self.service.find_assistant_by_name(&name).await? {
            Some(existing) => {
                info!(assistant_id = %existing.id, name = %name, "reusing assistant");
                existing
            }
            None => {
                let spec = AssistantSpec::builder()
                    .name(name)
                    .model(model)
                    .instructions(PLACEHOLDER_INSTRUCTIONS)
                    .build();
                let created = self.service.create_assistant(&spec).await?;
                info!(assistant_id = %created.id, name = %spec.name, "created assistant");
                created
            }
        };
        self.assistant = Some(assistant);
        Ok(self)
    }

    pub async fn set_instructions(mut self, instructions: String) -> Result<Self, ThreadrunError> {
        let id = self.assistant_id()?.to_string();
        let updated = self
            .service
            .update_assistant(&id, &AssistantPatch::instructions(instructions))
            .await?;
        self.assistant = Some(updated);
        Ok(self)
    }

    /// Replace the tool list; attaches the vector store when `file_search` is present.
    pub async fn set_tools(mut self, tools: Vec<serde_json::Value>) -> Result<Self, ThreadrunError> {
        let id = self.assistant_id()?.to_string();
        let mut patch = AssistantPatch::tools(tools);
        if patch.tools.as_deref().is_some_and(contains_file_search) {
            let vector_store_id = read_vector_store_id(&self.vector_store_file)?;
            info!(vector_store_id = %vector_store_id, "attaching vector store");
            patch = patch.with_tool_resources(serde_json::json!({
                "file_search": { "vector_store_ids": [vector_store_id] }
            }));
        }
        let updated = self.service.update_assistant(&id, &patch).await?;
        self.assistant = Some(updated);
        Ok(self)
    }
}

/// Tool entries for the assistant: `file_search` first if enabled, then every registered tool.
pub fn assistant_tools(config: &AssistantConfig, registry: &ToolRegistry) -> Vec<serde_json::Value> {
    let mut tools = Vec::with_capacity(registry.len() + 1);
    if config.file_search {
        tools.push(file_search_spec());
    }
    tools.extend(registry.function_specs());
    tools
}

/// Look up or create the configured assistant and bring it up to date.
pub async fn setup_assistant(
    service: Arc<dyn ConversationService>,
    config: &AssistantConfig,
    registry: &ToolRegistry,
) -> Result<Assistant, ThreadrunError> {
    let name = config.name.clone();
    let model = config.model.clone();
    let instructions = config.instructions.clone();
    let tools = assistant_tools(config, registry);

    let builder = DeferredChain::new(AssistantBuilder::new(service, config.vector_store_file.clone()))
        .then("get_or_create", move |b| b.get_or_create(name, model))
        .then("set_instructions", move |b| b.set_instructions(instructions))
        .then("set_tools", move |b| b.set_tools(tools))
        .execute()
        .await?;

    let assistant = builder.into_assistant()?;
    info!(assistant_id = %assistant.id, name = ?assistant.name, "assistant ready");
    Ok(assistant)
}
