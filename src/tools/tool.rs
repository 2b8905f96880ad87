//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use crate::error::BatonError;
use crate::types::ContextVariables;

/// Context available during tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Agent active when the tool is dispatched.
    pub agent: String,
    pub tool_call_id: String,
    /// Snapshot of the run's context variables.
    pub context_variables: ContextVariables,
}

/// What a tool hands back to the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Text for the tool message; `None` becomes an empty message.
    pub content: Option<String>,
    /// Updates merged into the run's context variables.
    pub context_variables: ContextVariables,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            context_variables: ContextVariables::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_context_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_variables.insert(key, value);
        self
    }
}

/// Core tool trait: implement to back a declared tool with behavior.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match the declaration the model sees).
    fn name(&self) -> &str;

    /// Execute the tool with decoded arguments.
    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, BatonError>;
}

type ToolFn = dyn Fn(
        ToolArguments,
        ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput, BatonError>> + Send>>
    + Send
    + Sync;

/// Closure-based tool for quick tool creation.
pub struct FunctionTool {
    name: String,
    handler: Arc<ToolFn>,
}

impl FunctionTool {
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ToolArguments, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput, BatonError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, BatonError> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .finish()
    }
}
