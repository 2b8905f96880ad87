//! Run event stream types.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::types::{Response, RunId};
use crate::error::BatonError;
use crate::types::ToolCallDelta;

/// Concrete event payloads emitted by a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A completion round is about to be requested.
    TurnStart { turn: usize, agent: String },
    TextDelta { text: String },
    /// Tool-call fragments exactly as the transport delivered them.
    ToolCallDeltas { deltas: Vec<ToolCallDelta> },
    /// The assistant message of this round was appended.
    TurnEnd { turn: usize, agent: String },
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        content: String,
    },
    Handoff { from: String, to: String },
    /// Always the last event of a successful run.
    Response { response: Response },
}

/// Envelope for streaming run events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunEvent {
    pub run_id: RunId,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub event: StreamEvent,
}

pub(crate) type EventSender = mpsc::Sender<Result<RunEvent, BatonError>>;

/// Sends envelopes to the run's consumer, honoring cancellation.
pub(crate) struct RunEventEmitter {
    run_id: RunId,
    seq: AtomicU64,
    tx: EventSender,
    cancel: CancellationToken,
}

impl RunEventEmitter {
    pub(crate) fn new(run_id: RunId, tx: EventSender, cancel: CancellationToken) -> Self {
        Self {
            run_id,
            seq: AtomicU64::new(1),
            tx,
            cancel,
        }
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Deliver one event. Waits while the consumer is behind; fails with
    /// `Canceled` if the run is canceled or the consumer went away.
    pub(crate) async fn emit(&self, event: StreamEvent) -> Result<(), BatonError> {
        let envelope = RunEvent {
            run_id: self.run_id,
            seq: self.seq.fetch_add(1, Ordering::SeqCst),
            timestamp: Utc::now(),
            event,
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BatonError::Canceled),
            sent = self.tx.send(Ok(envelope)) => sent.map_err(|_| BatonError::Canceled),
        }
    }

    /// Terminate the stream with an error. Nothing follows it.
    pub(crate) async fn fail(&self, err: BatonError) {
        if self.tx.send(Err(err)).await.is_err() {
            tracing::trace!(run_id = %self.run_id, "consumer gone before failure was delivered");
        }
    }
}
