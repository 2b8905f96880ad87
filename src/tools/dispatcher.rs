//! Tool dispatch and handoff resolution.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolContext, ToolOutput};
use crate::agent::{Agent, AgentDirectory};
use crate::error::BatonError;
use crate::types::{ContextVariables, ToolCall};

/// Produces the content of a tool call. Implemented per deployment.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// `Ok(None)` means the call yields no content.
    async fn handle(
        &self,
        call: &ToolCall,
        args: &ToolArguments,
        ctx: &ToolContext,
    ) -> Result<Option<ToolOutput>, BatonError>;
}

/// Name-keyed set of [`Tool`] implementations.
///
/// Calls to tools without a registered implementation yield no content.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any previous tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.register(Arc::new(tool));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

#[async_trait]
impl ToolHandler for ToolRegistry {
    async fn handle(
        &self,
        call: &ToolCall,
        args: &ToolArguments,
        ctx: &ToolContext,
    ) -> Result<Option<ToolOutput>, BatonError> {
        let Some(tool) = self.tools.get(call.name()) else {
            tracing::trace!(tool = call.name(), "no handler registered");
            return Ok(None);
        };
        tool.execute(args, ctx).await.map(Some)
    }
}

/// Outcome of dispatching one tool call.
#[derive(Debug, Clone, Default)]
pub struct Dispatch {
    /// Effective definition of the agent to hand off to.
    pub handoff: Option<Agent>,
    pub output: ToolOutput,
}

/// Resolves handoffs against a directory and delegates content to a handler.
///
/// Stateless from a run's point of view; share it across runs with `Arc`.
#[derive(Clone)]
pub struct Dispatcher {
    directory: Arc<AgentDirectory>,
    handler: Arc<dyn ToolHandler>,
}

impl Dispatcher {
    pub fn new(directory: Arc<AgentDirectory>, handler: Arc<dyn ToolHandler>) -> Self {
        Self { directory, handler }
    }

    /// Dispatcher whose tool calls produce no content; only handoffs act.
    pub fn handoffs_only(directory: Arc<AgentDirectory>) -> Self {
        Self::new(directory, Arc::new(ToolRegistry::new()))
    }

    pub fn directory(&self) -> &AgentDirectory {
        &self.directory
    }

    /// Find a handoff target named by value in `args`.
    ///
    /// Only keys exposed by `current`'s tools are inspected; the first
    /// string value equal to a known agent name wins.
    pub fn resolve_handoff(&self, current: &Agent, args: &ToolArguments) -> Option<Agent> {
        current
            .argument_keys()
            .filter_map(|key| args.get_str_opt(key))
            .find_map(|value| self.directory.effective(value))
    }

    /// Decode a call's arguments, resolve any handoff and run its handler.
    pub async fn dispatch(
        &self,
        current: &Agent,
        call: &ToolCall,
        context_variables: &ContextVariables,
    ) -> Result<Dispatch, BatonError> {
        let args = ToolArguments::parse(&call.function.arguments);
        let handoff = self.resolve_handoff(current, &args);
        let ctx = ToolContext {
            agent: current.name.clone(),
            tool_call_id: call.id.clone(),
            context_variables: context_variables.clone(),
        };
        let output = self
            .handler
            .handle(call, &args, &ctx)
            .await?
            .unwrap_or_default();
        Ok(Dispatch { handoff, output })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}
