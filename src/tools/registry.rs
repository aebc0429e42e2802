//! Process-wide name to tool mapping.

use std::collections::HashMap;
use std::sync::Arc;

use super::tool::Tool;
use crate::error::ThreadrunError;

/// Immutable set of tools, keyed by name.
///
/// Built once at startup with [`ToolRegistry::builder`] and shared behind an
/// `Arc`; there is no way to add or remove tools afterwards.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Tool names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Function tool entries for the assistant, in registration order.
    pub fn function_specs(&self) -> Vec<serde_json::Value> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.function_spec())
            .collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistryBuilder {
    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn register_all(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Fails if two tools share a name.
    pub fn build(self) -> Result<ToolRegistry, ThreadrunError> {
        let mut registry = ToolRegistry::default();
        for tool in self.tools {
            let name = tool.name().to_string();
            if registry.tools.contains_key(&name) {
                return Err(ThreadrunError::Configuration(format!(
                    "duplicate tool name: {name}"
                )));
            }
            registry.order.push(name.clone());
            registry.tools.insert(name, tool);
        }
        Ok(registry)
    }
}
