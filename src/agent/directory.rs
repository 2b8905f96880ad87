//! Registry of agent personas.

use std::path::Path;

use serde::Deserialize;

use super::agent::Agent;
use super::handoff::{handoff_tool, HandoffPolicy};
use crate::error::BatonError;
use crate::tools::ToolDeclaration;

/// The closed set of agents a run can hand off between.
///
/// Effective agent definitions (declared tools plus handoff tools) are
/// derived on every lookup, so they always reflect the current membership.
#[derive(Debug, Clone, Default)]
pub struct AgentDirectory {
    agents: Vec<Agent>,
    policy: HandoffPolicy,
}

#[derive(Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    handoff_policy: HandoffPolicy,
    #[serde(default)]
    agents: Vec<Agent>,
}

impl AgentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: HandoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build a directory from agents, rejecting duplicate names.
    pub fn from_agents(agents: impl IntoIterator<Item = Agent>) -> Result<Self, BatonError> {
        let mut directory = Self::new();
        for agent in agents {
            directory.register(agent)?;
        }
        Ok(directory)
    }

    /// Parse a TOML directory definition.
    ///
    /// ```toml
    /// handoff_policy = "others"
    ///
    /// [[agents]]
    /// name = "Engineer"
    /// instructions = "You write code."
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, BatonError> {
        let file: DirectoryFile = toml::from_str(source)?;
        Ok(Self::from_agents(file.agents)?.with_policy(file.handoff_policy))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, BatonError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    /// Add an agent. Names must be unique.
    pub fn register(&mut self, agent: Agent) -> Result<(), BatonError> {
        agent.validate()?;
        if self.get(&agent.name).is_some() {
            return Err(BatonError::Configuration(format!(
                "agent '{}' is already registered",
                agent.name
            )));
        }
        self.agents.push(agent);
        Ok(())
    }

    pub fn policy(&self) -> HandoffPolicy {
        self.policy
    }

    /// Declared agent, without handoff tools.
    pub fn get(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.agents.iter().map(|a| a.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Handoff tools generated for the agent named `for_agent`.
    pub fn handoff_tools(&self, for_agent: &str) -> Vec<ToolDeclaration> {
        if self.agents.len() < 2 {
            return Vec::new();
        }
        self.agents
            .iter()
            .filter(|target| match self.policy {
                HandoffPolicy::Others => target.name != for_agent,
                HandoffPolicy::All => true,
            })
            .map(|target| handoff_tool(&target.name))
            .collect()
    }

    /// Agent as sent to the model: declared tools followed by handoff tools.
    ///
    /// A declared tool shadows a handoff tool of the same name.
    pub fn effective(&self, name: &str) -> Option<Agent> {
        let mut agent = self.get(name)?.clone();
        for tool in self.handoff_tools(name) {
            if !agent.declares_tool(&tool.name) {
                agent.tools.push(tool);
            }
        }
        Some(agent)
    }
}
