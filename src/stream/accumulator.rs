//! Folds streamed completion deltas into a complete assistant turn.

use crate::types::{
    CompletionDelta, FinishReason, FunctionCall, ToolCall, ToolCallDelta, ToolCallType,
};

/// Everything a completion produced once its stream ended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccumulatedTurn {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug)]
struct PendingCall {
    /// Join key for fragments that arrive without an id.
    index: usize,
    id: String,
    kind: Option<ToolCallType>,
    name: String,
    arguments: String,
}

/// Streaming accumulator for text and tool-call fragments.
///
/// Tool calls are keyed by id once one is seen. Fragments without an id are
/// joined to the registered call whose stored index matches, and dropped
/// when there is none.
#[derive(Debug, Default)]
pub struct DeltaAccumulator {
    text: String,
    calls: Vec<PendingCall>,
    finish_reason: Option<FinishReason>,
}

impl DeltaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one delta in. Returns `true` once the terminal marker was seen.
    pub fn push(&mut self, delta: &CompletionDelta) -> bool {
        if let Some(text) = delta.content.as_deref() {
            self.text.push_str(text);
        }
        for call in &delta.tool_calls {
            self.push_tool_call(call);
        }
        if let Some(reason) = delta.finish_reason {
            self.finish_reason = Some(reason);
        }
        self.is_finished()
    }

    fn push_tool_call(&mut self, delta: &ToolCallDelta) {
        match delta.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => self.register(id, delta),
            None => self.append(delta),
        }
    }

    fn register(&mut self, id: &str, delta: &ToolCallDelta) {
        let slot = self.calls.iter().position(|c| c.id == id);
        let pending = PendingCall {
            index: delta.index.unwrap_or(slot.unwrap_or(self.calls.len())),
            id: id.to_string(),
            kind: delta.kind,
            name: delta.name().unwrap_or_default().to_string(),
            arguments: delta.arguments().to_string(),
        };
        match slot {
            Some(slot) => self.calls[slot] = pending,
            None => self.calls.push(pending),
        }
    }

    fn append(&mut self, delta: &ToolCallDelta) {
        let Some(index) = delta.index else {
            tracing::trace!("dropping tool call delta without id or index");
            return;
        };
        let Some(pending) = self.calls.iter_mut().rev().find(|c| c.index == index) else {
            tracing::trace!(index, "dropping tool call delta for unknown index");
            return;
        };
        pending.arguments.push_str(delta.arguments());
        if pending.name.is_empty() {
            if let Some(name) = delta.name() {
                pending.name = name.to_string();
            }
        }
        if pending.kind.is_none() {
            pending.kind = delta.kind;
        }
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of tool calls registered so far.
    pub fn tool_call_count(&self) -> usize {
        self.calls.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finish_reason.is_some()
    }

    /// Finalize into text plus one tool call per registered id, in
    /// registration order. Arguments are left unparsed.
    pub fn finish(self) -> AccumulatedTurn {
        let tool_calls = self
            .calls
            .into_iter()
            .map(|pending| ToolCall {
                id: pending.id,
                kind: pending.kind.unwrap_or_default(),
                function: FunctionCall {
                    name: pending.name,
                    arguments: pending.arguments,
                },
            })
            .collect();
        AccumulatedTurn {
            text: self.text,
            tool_calls,
            finish_reason: self.finish_reason,
        }
    }
}
