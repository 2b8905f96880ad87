//! Completion transport trait and implementations.

pub mod http;

#[cfg(feature = "openai")]
pub mod openai;

use async_trait::async_trait;
use bon::Builder;
use futures::stream::BoxStream;

use crate::error::BatonError;
use crate::tools::ToolDeclaration;
use crate::types::{CompletionDelta, Message, ToolChoice};

/// A request sent to a completion transport.
#[derive(Debug, Clone, Builder, PartialEq)]
pub struct CompletionRequest {
    #[builder(into)]
    pub model: String,
    pub messages: Vec<Message>,
    #[builder(default)]
    pub tools: Vec<ToolDeclaration>,
    pub tool_choice: Option<ToolChoice>,
    #[builder(default = true)]
    pub parallel_tool_calls: bool,
}

/// Stream of deltas for one completion.
pub type DeltaStream = BoxStream<'static, Result<CompletionDelta, BatonError>>;

/// A streaming chat-completion service.
///
/// The returned stream ends after the delta carrying a finish reason, or
/// with an error.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Transport name (e.g. "openai").
    fn name(&self) -> &str;

    async fn stream(&self, request: &CompletionRequest) -> Result<DeltaStream, BatonError>;
}

#[cfg(feature = "openai")]
pub use openai::OpenAiTransport;
