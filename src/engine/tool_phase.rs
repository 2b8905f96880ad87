//! Tool execution for one assistant turn.

use super::events::{RunEventEmitter, StreamEvent};
use crate::agent::Agent;
use crate::error::BatonError;
use crate::tools::Dispatcher;
use crate::types::{ContextVariables, Message, ToolCall};

/// What a batch of tool calls produced.
#[derive(Debug)]
pub(crate) struct ToolBatch {
    /// Tool messages in call order.
    pub messages: Vec<Message>,
    /// Active agent after any handoffs in the batch.
    pub agent: Agent,
    pub context_updates: ContextVariables,
}

/// Run `calls` in order on behalf of `issuing`.
///
/// Calls naming a tool `issuing` does not declare are skipped. A handoff
/// switches the active agent for the remaining calls of the batch.
pub(crate) async fn execute_tool_calls(
    dispatcher: &Dispatcher,
    issuing: &Agent,
    calls: &[ToolCall],
    context_variables: &ContextVariables,
    emitter: &RunEventEmitter,
) -> Result<ToolBatch, BatonError> {
    let cancel = emitter.cancel_token();
    let mut current = issuing.clone();
    let mut messages = Vec::with_capacity(calls.len());
    let mut context_updates = ContextVariables::new();

    for call in calls {
        if !issuing.declares_tool(call.name()) {
            tracing::warn!(
                agent = %issuing.name,
                tool = call.name(),
                tool_call_id = %call.id,
                "skipping call to undeclared tool"
            );
            continue;
        }

        let dispatch = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BatonError::Canceled),
            dispatch = dispatcher.dispatch(&current, call, context_variables) => dispatch?,
        };

        if let Some(target) = dispatch.handoff {
            tracing::debug!(from = %current.name, to = %target.name, "handoff");
            if target.name != current.name {
                emitter
                    .emit(StreamEvent::Handoff {
                        from: current.name.clone(),
                        to: target.name.clone(),
                    })
                    .await?;
            }
            current = target;
        }

        let content = dispatch.output.content.unwrap_or_default();
        messages.push(Message::tool_result(call.id.clone(), content.clone()));
        emitter
            .emit(StreamEvent::ToolResult {
                tool_call_id: call.id.clone(),
                tool_name: call.name().to_string(),
                content,
            })
            .await?;
        context_updates.merge(dispatch.output.context_variables);
    }

    Ok(ToolBatch {
        messages,
        agent: current,
        context_updates,
    })
}
