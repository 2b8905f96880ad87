//! Shared test helpers and scripted mock transport.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;

use baton::agent::{Agent, AgentDirectory};
use baton::engine::{Orchestrator, RunEvent, StreamEvent};
use baton::error::BatonError;
use baton::tools::{Dispatcher, ToolDeclaration, ToolHandler, ToolParameters};
use baton::transport::{CompletionRequest, CompletionTransport, DeltaStream};
use baton::types::{CompletionDelta, FinishReason, ToolCallDelta};

/// What the transport does for one completion request.
pub enum Script {
    /// Stream these items, then end.
    Deltas(Vec<Result<CompletionDelta, BatonError>>),
    /// Fail before any delta is produced.
    Fail(BatonError),
    /// Stream these deltas, then never yield again.
    Hang(Vec<CompletionDelta>),
}

/// A transport that replays queued scripts and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedTransport {
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream(&self, request: &CompletionRequest) -> Result<DeltaStream, BatonError> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| BatonError::Transport("no scripted response left".into()))?;
        match script {
            Script::Deltas(items) => Ok(futures::stream::iter(items).boxed()),
            Script::Fail(err) => Err(err),
            Script::Hang(deltas) => Ok(futures::stream::iter(deltas.into_iter().map(Ok))
                .chain(futures::stream::pending())
                .boxed()),
        }
    }
}

/// A plain text completion, streamed in small fragments.
pub fn text_turn(text: &str) -> Script {
    let chars: Vec<char> = text.chars().collect();
    let mut items: Vec<Result<CompletionDelta, BatonError>> = chars
        .chunks(3)
        .map(|chunk| Ok(CompletionDelta::text(chunk.iter().collect::<String>())))
        .collect();
    items.push(Ok(CompletionDelta::finished(FinishReason::Stop)));
    Script::Deltas(items)
}

/// A completion requesting one call per `(id, name, arguments)`.
///
/// Each call opens with its id and name; the arguments follow in two
/// index-only fragments.
pub fn tool_turn(calls: &[(&str, &str, &str)]) -> Script {
    let mut items = Vec::new();
    for (index, (id, name, arguments)) in calls.iter().enumerate() {
        let (head, tail) = arguments.split_at(arguments.len() / 2);
        items.push(Ok(CompletionDelta::tool_calls(vec![ToolCallDelta::start(
            index, *id, *name, "",
        )])));
        items.push(Ok(CompletionDelta::tool_calls(vec![ToolCallDelta::append(
            index, head,
        )])));
        items.push(Ok(CompletionDelta::tool_calls(vec![ToolCallDelta::append(
            index, tail,
        )])));
    }
    items.push(Ok(CompletionDelta::finished(FinishReason::ToolCalls)));
    Script::Deltas(items)
}

/// Handoff arguments naming `agent`.
pub fn handoff_args(agent: &str) -> String {
    serde_json::json!({ "agentID": agent }).to_string()
}

pub fn engineer() -> Agent {
    Agent::builder()
        .name("Engineer")
        .instructions("You are an engineer.")
        .tools(vec![
            ToolDeclaration::new(
                "DesignMode",
                "switch the session to design work",
                ToolParameters::object()
                    .string("mode", "the mode to enter", true)
                    .build(),
            ),
            ToolDeclaration::new(
                "remember",
                "store a fact",
                ToolParameters::object()
                    .string("fact", "what to store", true)
                    .build(),
            ),
        ])
        .build()
}

pub fn designer() -> Agent {
    Agent::simple("Designer", "You are a designer.")
}

pub fn team() -> Arc<AgentDirectory> {
    Arc::new(AgentDirectory::from_agents([engineer(), designer()]).unwrap())
}

pub fn orchestrator(transport: Arc<ScriptedTransport>, handler: Arc<dyn ToolHandler>) -> Orchestrator {
    Orchestrator::new(transport, Arc::new(Dispatcher::new(team(), handler)))
}

/// Drain a run, returning every event and the terminal error, if any.
pub async fn collect<S>(mut events: S) -> (Vec<RunEvent>, Option<BatonError>)
where
    S: futures::Stream<Item = Result<RunEvent, BatonError>> + Unpin,
{
    let mut collected = Vec::new();
    while let Some(item) = events.next().await {
        match item {
            Ok(event) => collected.push(event),
            Err(err) => return (collected, Some(err)),
        }
    }
    (collected, None)
}

pub fn payloads(events: &[RunEvent]) -> Vec<&StreamEvent> {
    events.iter().map(|e| &e.event).collect()
}
