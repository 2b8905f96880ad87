//! Agent persona definition.

use std::collections::HashSet;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::BatonError;
use crate::tools::ToolDeclaration;
use crate::types::ToolChoice;

/// Model used when an agent does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// A named persona with its own instructions, model and toolset.
///
/// Agents are immutable values; a run switches between them but never edits
/// one in place.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    #[builder(into)]
    pub name: String,
    #[builder(into, default = DEFAULT_MODEL.to_string())]
    #[serde(default = "default_model")]
    pub model: String,
    #[builder(into, default)]
    #[serde(default)]
    pub instructions: String,
    #[builder(default)]
    #[serde(default)]
    pub tools: Vec<ToolDeclaration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[builder(default = true)]
    #[serde(default = "default_parallel_tool_calls")]
    pub parallel_tool_calls: bool,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_parallel_tool_calls() -> bool {
    true
}

impl Agent {
    /// Agent with a name and instructions, default model and no tools.
    pub fn simple(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self::builder().name(name).instructions(instructions).build()
    }

    /// Look up a declared tool by name.
    pub fn tool(&self, name: &str) -> Option<&ToolDeclaration> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn declares_tool(&self, name: &str) -> bool {
        self.tool(name).is_some()
    }

    /// Every property key exposed by this agent's tools.
    pub fn argument_keys(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().flat_map(|t| t.parameters.property_names())
    }

    /// Check the invariants a directory relies on.
    pub fn validate(&self) -> Result<(), BatonError> {
        if self.name.trim().is_empty() {
            return Err(BatonError::Configuration("agent name must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for tool in &self.tools {
            if !seen.insert(tool.name.as_str()) {
                return Err(BatonError::Configuration(format!(
                    "agent '{}' declares tool '{}' more than once",
                    self.name, tool.name
                )));
            }
        }
        Ok(())
    }
}
