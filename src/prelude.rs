//! Convenience re-exports for common use.

pub use crate::agent::{Agent, AgentDirectory, HandoffPolicy};
pub use crate::config::BatonConfig;
pub use crate::engine::{Orchestrator, Response, RunEvent, RunHandle, RunRequest, Runner, StreamEvent};
pub use crate::error::{BatonError, Result};
pub use crate::tools::{
    Dispatcher, FunctionTool, Tool, ToolArguments, ToolContext, ToolDeclaration, ToolHandler,
    ToolOutput, ToolParameters, ToolRegistry,
};
pub use crate::transport::{CompletionRequest, CompletionTransport};
pub use crate::types::{ContextVariables, Message, Role, ToolCall, ToolChoice};
