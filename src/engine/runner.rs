//! Runner interfaces and the turn loop.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::events::{RunEvent, RunEventEmitter, StreamEvent};
use super::llm_phase::{build_request, stream_completion};
use super::tool_phase::execute_tool_calls;
use super::types::{Response, RunId, RunRequest};
use crate::agent::Agent;
use crate::config::{BatonConfig, DEFAULT_EVENT_BUFFER, DEFAULT_MAX_TURNS};
use crate::error::BatonError;
use crate::tools::Dispatcher;
use crate::transport::CompletionTransport;
use crate::types::{ContextVariables, Message};

/// Runner trait for executing run requests.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn start(&self, request: RunRequest) -> Result<RunHandle, BatonError>;
}

/// Handle for an in-flight run.
///
/// A stream of [`RunEvent`]s ending with a `Response` event, or with an
/// error. Dropping the handle cancels the run.
#[derive(Debug)]
pub struct RunHandle {
    run_id: RunId,
    events: ReceiverStream<Result<RunEvent, BatonError>>,
    cancel: CancellationToken,
}

impl RunHandle {
    /// Create a handle plus the sending half a runner drives.
    pub fn new(
        run_id: RunId,
        buffer: usize,
    ) -> (
        Self,
        mpsc::Sender<Result<RunEvent, BatonError>>,
        CancellationToken,
    ) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let cancel = CancellationToken::new();
        (
            Self {
                run_id,
                events: ReceiverStream::new(rx),
                cancel: cancel.clone(),
            },
            tx,
            cancel,
        )
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Stop the run at its next suspension point. The stream then ends with
    /// `BatonError::Canceled`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drain the stream and return the final response.
    pub async fn response(mut self) -> Result<Response, BatonError> {
        while let Some(event) = self.next().await {
            if let StreamEvent::Response { response } = event?.event {
                return Ok(response);
            }
        }
        Err(BatonError::Canceled)
    }
}

impl Stream for RunHandle {
    type Item = Result<RunEvent, BatonError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Multi-agent orchestrator: runs the completion/tool/handoff loop.
///
/// Cheap to share; every run gets its own task and turn state.
#[derive(Clone)]
pub struct Orchestrator {
    transport: Arc<dyn CompletionTransport>,
    dispatcher: Arc<Dispatcher>,
    default_model: String,
    max_turns: usize,
    event_buffer: usize,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn CompletionTransport>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            transport,
            dispatcher,
            default_model: crate::agent::DEFAULT_MODEL.to_string(),
            max_turns: DEFAULT_MAX_TURNS,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }

    /// Orchestrator with model, turn cap and buffer taken from `config`.
    pub fn from_config(
        config: &BatonConfig,
        transport: Arc<dyn CompletionTransport>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self::new(transport, dispatcher)
            .with_default_model(config.model())
            .with_max_turns(config.max_turns())
            .with_event_buffer(config.event_buffer())
    }

    /// Model for agents that do not name one.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Completion rounds per run; `0` behaves like `1`.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_event_buffer(mut self, event_buffer: usize) -> Self {
        self.event_buffer = event_buffer;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Start a run; see [`Runner::start`].
    pub async fn run(&self, request: RunRequest) -> Result<RunHandle, BatonError> {
        self.start(request).await
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("transport", &self.transport.name())
            .field("default_model", &self.default_model)
            .field("max_turns", &self.max_turns)
            .field("event_buffer", &self.event_buffer)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Runner for Orchestrator {
    async fn start(&self, request: RunRequest) -> Result<RunHandle, BatonError> {
        let agent = self
            .dispatcher
            .directory()
            .effective(&request.agent)
            .ok_or_else(|| BatonError::UnknownAgent(request.agent.clone()))?;

        let run_id = request.run_id;
        let (handle, tx, cancel) = RunHandle::new(run_id, self.event_buffer);
        let emitter = RunEventEmitter::new(run_id, tx, cancel);
        let state = RunState {
            transport: Arc::clone(&self.transport),
            dispatcher: Arc::clone(&self.dispatcher),
            default_model: self.default_model.clone(),
            max_turns: request.max_turns.unwrap_or(self.max_turns).max(1),
            agent,
            history: request.messages,
            new_from: 0,
            context_variables: request.context_variables,
            model_override: request.model_override,
            execute_tools: request.execute_tools,
        };

        tokio::spawn(async move {
            tracing::debug!(%run_id, agent = %state.agent.name, "run start");
            match state.drive(&emitter).await {
                Ok(()) => tracing::debug!(%run_id, "run completed"),
                Err(BatonError::Canceled) => {
                    tracing::debug!(%run_id, "run canceled");
                    emitter.fail(BatonError::Canceled).await;
                }
                Err(err) => {
                    tracing::debug!(%run_id, error = %err, "run failed");
                    emitter.fail(err).await;
                }
            }
        });

        Ok(handle)
    }
}

/// Turn state owned by one run's task.
struct RunState {
    transport: Arc<dyn CompletionTransport>,
    dispatcher: Arc<Dispatcher>,
    default_model: String,
    max_turns: usize,
    /// Effective definition of the active agent.
    agent: Agent,
    history: Vec<Message>,
    /// Index of the first message produced by this run.
    new_from: usize,
    context_variables: ContextVariables,
    model_override: Option<String>,
    execute_tools: bool,
}

impl RunState {
    async fn drive(mut self, emitter: &RunEventEmitter) -> Result<(), BatonError> {
        self.new_from = self.history.len();
        let mut turn = 0usize;

        loop {
            if emitter.cancel_token().is_cancelled() {
                return Err(BatonError::Canceled);
            }
            turn += 1;

            emitter
                .emit(StreamEvent::TurnStart {
                    turn,
                    agent: self.agent.name.clone(),
                })
                .await?;

            let request = build_request(
                &self.agent,
                &self.history,
                self.model_override.as_deref(),
                &self.default_model,
            );
            let completion = stream_completion(self.transport.as_ref(), &request, emitter).await?;

            tracing::debug!(
                agent = %self.agent.name,
                turn,
                tool_calls = completion.tool_calls.len(),
                text_len = completion.text.len(),
                "turn complete"
            );

            let calls = completion.tool_calls.clone();
            self.history
                .push(Message::assistant_turn(completion.text, completion.tool_calls));
            emitter
                .emit(StreamEvent::TurnEnd {
                    turn,
                    agent: self.agent.name.clone(),
                })
                .await?;

            if calls.is_empty() || !self.execute_tools {
                break;
            }

            let batch = execute_tool_calls(
                &self.dispatcher,
                &self.agent,
                &calls,
                &self.context_variables,
                emitter,
            )
            .await?;
            self.history.extend(batch.messages);
            self.agent = batch.agent;
            self.context_variables.merge(batch.context_updates);

            if turn >= self.max_turns {
                tracing::debug!(turn, max_turns = self.max_turns, "turn cap reached");
                break;
            }
        }

        let response = Response {
            messages: self.history.split_off(self.new_from),
            agent: self.agent,
            context_variables: self.context_variables,
        };
        emitter.emit(StreamEvent::Response { response }).await
    }
}
