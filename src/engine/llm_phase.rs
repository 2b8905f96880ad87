//! One completion round: build the request, stream it, fold the deltas.

use futures::StreamExt;

use super::events::{RunEventEmitter, StreamEvent};
use crate::agent::Agent;
use crate::error::BatonError;
use crate::stream::{AccumulatedTurn, DeltaAccumulator};
use crate::transport::{CompletionRequest, CompletionTransport};
use crate::types::{Message, Role};

/// Request for `agent` over `history`.
///
/// The agent's instructions replace the most recent system message, or are
/// inserted as the first message when there is none.
pub(crate) fn build_request(
    agent: &Agent,
    history: &[Message],
    model_override: Option<&str>,
    default_model: &str,
) -> CompletionRequest {
    let mut messages = history.to_vec();
    let system = Message::system(agent.instructions.clone());
    match messages.iter().rposition(|m| m.role == Role::System) {
        Some(pos) => messages[pos] = system,
        None => messages.insert(0, system),
    }

    let model = model_override
        .filter(|m| !m.is_empty())
        .or_else(|| Some(agent.model.as_str()).filter(|m| !m.is_empty()))
        .unwrap_or(default_model);

    CompletionRequest::builder()
        .model(model)
        .messages(messages)
        .tools(agent.tools.clone())
        .maybe_tool_choice(agent.tool_choice.clone())
        .parallel_tool_calls(agent.parallel_tool_calls)
        .build()
}

/// Send `request` and accumulate its stream, forwarding every fragment.
pub(crate) async fn stream_completion(
    transport: &dyn CompletionTransport,
    request: &CompletionRequest,
    emitter: &RunEventEmitter,
) -> Result<AccumulatedTurn, BatonError> {
    let cancel = emitter.cancel_token();
    let mut stream = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(BatonError::Canceled),
        stream = transport.stream(request) => stream?,
    };

    let mut accumulator = DeltaAccumulator::new();
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BatonError::Canceled),
            next = stream.next() => next,
        };
        let Some(delta) = next else { break };
        let delta = delta?;

        let finished = accumulator.push(&delta);
        if let Some(text) = delta.content.filter(|t| !t.is_empty()) {
            emitter.emit(StreamEvent::TextDelta { text }).await?;
        }
        if !delta.tool_calls.is_empty() {
            tracing::trace!(count = delta.tool_calls.len(), "tool call deltas");
            emitter
                .emit(StreamEvent::ToolCallDeltas {
                    deltas: delta.tool_calls,
                })
                .await?;
        }
        if finished {
            break;
        }
    }

    Ok(accumulator.finish())
}
