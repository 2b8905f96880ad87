//! Core run types for the engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::Agent;
use crate::types::{ContextVariables, Message};

/// Unique run identifier.
pub type RunId = Uuid;

/// Request payload to start a run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub run_id: RunId,
    /// Name of the starting agent; must exist in the directory.
    pub agent: String,
    pub messages: Vec<Message>,
    pub context_variables: ContextVariables,
    /// Replaces every agent's model for this run.
    pub model_override: Option<String>,
    /// When false the run ends after the first completion even if it
    /// requested tool calls.
    pub execute_tools: bool,
    /// Completion rounds allowed; falls back to the engine setting.
    pub max_turns: Option<usize>,
}

impl RunRequest {
    pub fn new(agent: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            agent: agent.into(),
            messages,
            context_variables: ContextVariables::new(),
            model_override: None,
            execute_tools: true,
            max_turns: None,
        }
    }

    pub fn with_context_variables(mut self, context_variables: ContextVariables) -> Self {
        self.context_variables = context_variables;
        self
    }

    pub fn with_model_override(mut self, model: impl Into<String>) -> Self {
        self.model_override = Some(model.into());
        self
    }

    pub fn with_execute_tools(mut self, execute_tools: bool) -> Self {
        self.execute_tools = execute_tools;
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self
    }
}

/// Final outcome of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    /// Messages appended during the run; the input history is excluded.
    pub messages: Vec<Message>,
    /// Agent active when the run ended.
    pub agent: Agent,
    pub context_variables: ContextVariables,
}

impl Response {
    /// Text of the last assistant message, if any.
    pub fn last_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::types::Role::Assistant)
            .and_then(|m| m.content.as_deref())
    }
}
