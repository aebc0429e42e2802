//! Assistant configuration entity.

use bon::Builder;
use serde::{Deserialize, Serialize};

/// Snapshot of the remote assistant, as last returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assistant {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default)]
    pub tools: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<serde_json::Value>,
}

/// Fields used to create a new assistant.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct AssistantSpec {
    #[builder(into)]
    pub name: String,
    #[builder(into)]
    pub model: String,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Partial update of an existing assistant. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssistantPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_resources: Option<serde_json::Value>,
}

impl AssistantPatch {
    pub fn instructions(text: impl Into<String>) -> Self {
        Self {
            instructions: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn tools(tools: Vec<serde_json::Value>) -> Self {
        Self {
            tools: Some(tools),
            ..Default::default()
        }
    }

    pub fn with_tool_resources(mut self, resources: serde_json::Value) -> Self {
        self.tool_resources = Some(resources);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = AssistantPatch::instructions("be brief");
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({ "instructions": "be brief" }));
    }

    #[test]
    fn spec_builder_accepts_str() {
        let spec = AssistantSpec::builder()
            .name("Data Engineer")
            .model("gpt-4o")
            .build();
        assert_eq!(spec.name, "Data Engineer");
        assert!(spec.instructions.is_none());
    }
}
