//! End-to-end tests for the orchestration engine.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;

use baton::engine::{RunRequest, Runner, StreamEvent};
use baton::error::BatonError;
use baton::tools::{FunctionTool, ToolOutput, ToolRegistry};
use baton::types::{CompletionDelta, ContextVariables, Message, Role, ToolCall, ToolCallDelta};
use common::*;

fn no_tools() -> Arc<ToolRegistry> {
    Arc::new(ToolRegistry::new())
}

fn hello() -> Vec<Message> {
    vec![Message::user("hello")]
}

#[tokio::test]
async fn plain_reply_finishes_in_one_round() {
    let transport = ScriptedTransport::new([text_turn("hi there")]);
    let orchestrator = orchestrator(transport.clone(), no_tools());

    let handle = orchestrator.run(RunRequest::new("Engineer", hello())).await.unwrap();
    let response = handle.response().await.unwrap();

    assert_eq!(response.messages, vec![Message::assistant("hi there")]);
    assert_eq!(response.agent.name, "Engineer");
    assert!(response.context_variables.is_empty());
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn first_request_carries_instructions_and_effective_tools() {
    let transport = ScriptedTransport::new([text_turn("hi")]);
    let orchestrator = orchestrator(transport.clone(), no_tools());

    orchestrator
        .run(RunRequest::new("Engineer", hello()))
        .await
        .unwrap()
        .response()
        .await
        .unwrap();

    let request = &transport.requests()[0];
    assert_eq!(
        request.messages,
        vec![Message::system("You are an engineer."), Message::user("hello")]
    );
    let tool_names: Vec<&str> = request.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tool_names, vec!["DesignMode", "remember", "Designer"]);
    assert_eq!(request.model, baton::agent::DEFAULT_MODEL);
}

#[tokio::test]
async fn existing_system_message_is_replaced() {
    let transport = ScriptedTransport::new([text_turn("hi")]);
    let orchestrator = orchestrator(transport.clone(), no_tools());
    let messages = vec![Message::system("stale"), Message::user("hello")];

    let response = orchestrator
        .run(RunRequest::new("Designer", messages))
        .await
        .unwrap()
        .response()
        .await
        .unwrap();

    let request = &transport.requests()[0];
    assert_eq!(
        request.messages,
        vec![Message::system("You are a designer."), Message::user("hello")]
    );
    assert_eq!(response.messages.len(), 1);
}

#[tokio::test]
async fn handoff_switches_agent_for_the_next_round() {
    let transport = ScriptedTransport::new([
        tool_turn(&[("call_1", "Designer", handoff_args("Designer").as_str())]),
        text_turn("ok"),
    ]);
    let orchestrator = orchestrator(transport.clone(), no_tools());

    let handle = orchestrator.run(RunRequest::new("Engineer", hello())).await.unwrap();
    let (events, err) = collect(handle).await;
    assert!(err.is_none());

    let Some(StreamEvent::Response { response }) = events.last().map(|e| &e.event) else {
        panic!("run did not end with a response");
    };
    assert_eq!(response.agent.name, "Designer");
    assert_eq!(
        response.messages,
        vec![
            Message::assistant_turn(
                String::new(),
                vec![ToolCall::function("call_1", "Designer", handoff_args("Designer"))]
            ),
            Message::tool_result("call_1", ""),
            Message::assistant("ok"),
        ]
    );

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].messages[0], Message::system("You are a designer."));
    let tool_names: Vec<&str> = requests[1].tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tool_names, vec!["Engineer"]);

    assert!(payloads(&events).contains(&&StreamEvent::Handoff {
        from: "Engineer".into(),
        to: "Designer".into(),
    }));
}

#[tokio::test]
async fn handoff_is_resolved_by_argument_value_not_tool_name() {
    let transport = ScriptedTransport::new([
        tool_turn(&[("call_1", "DesignMode", handoff_args("Designer").as_str())]),
        text_turn("ok"),
    ]);
    let orchestrator = orchestrator(transport, no_tools());

    let response = orchestrator
        .run(RunRequest::new("Engineer", hello()))
        .await
        .unwrap()
        .response()
        .await
        .unwrap();

    assert_eq!(response.agent.name, "Designer");
}

#[tokio::test]
async fn argument_value_naming_no_agent_keeps_current_agent() {
    let transport = ScriptedTransport::new([
        tool_turn(&[("call_1", "DesignMode", r#"{"mode":"sketch"}"#)]),
        text_turn("ok"),
    ]);
    let orchestrator = orchestrator(transport, no_tools());

    let response = orchestrator
        .run(RunRequest::new("Engineer", hello()))
        .await
        .unwrap()
        .response()
        .await
        .unwrap();

    assert_eq!(response.agent.name, "Engineer");
}

#[tokio::test]
async fn undeclared_tool_is_skipped_and_later_calls_still_run() {
    let transport = ScriptedTransport::new([
        tool_turn(&[
            ("call_1", "nonexistent", "{}"),
            ("call_2", "Designer", handoff_args("Designer").as_str()),
        ]),
        text_turn("ok"),
    ]);
    let orchestrator = orchestrator(transport, no_tools());

    let response = orchestrator
        .run(RunRequest::new("Engineer", hello()))
        .await
        .unwrap()
        .response()
        .await
        .unwrap();

    let tool_messages: Vec<&Message> = response
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .collect();
    assert_eq!(tool_messages, vec![&Message::tool_result("call_2", "")]);
    assert_eq!(response.agent.name, "Designer");
}

#[tokio::test]
async fn tool_output_and_context_updates_flow_into_the_run() {
    let registry = ToolRegistry::new().with_tool(FunctionTool::new("remember", |args, ctx| async move {
        let fact = args.get_str("fact")?.to_string();
        let previous = ctx.context_variables.get("fact").unwrap_or("none").to_string();
        Ok::<_, BatonError>(
            ToolOutput::text(format!("stored {fact} (was {previous})"))
                .with_context_variable("fact", fact)
                .with_context_variable("stored_by", ctx.agent),
        )
    }));
    let transport = ScriptedTransport::new([
        tool_turn(&[("call_1", "remember", r#"{"fact":"blue"}"#)]),
        text_turn("noted"),
    ]);
    let orchestrator = orchestrator(transport, Arc::new(registry));

    let initial: ContextVariables = [("fact", "red"), ("user", "ada")].into_iter().collect();
    let response = orchestrator
        .run(RunRequest::new("Engineer", hello()).with_context_variables(initial))
        .await
        .unwrap()
        .response()
        .await
        .unwrap();

    assert_eq!(response.messages[1], Message::tool_result("call_1", "stored blue (was red)"));
    let expected: ContextVariables = [("fact", "blue"), ("stored_by", "Engineer"), ("user", "ada")]
        .into_iter()
        .collect();
    assert_eq!(response.context_variables, expected);
}

#[tokio::test]
async fn disabled_tool_execution_stops_after_first_round() {
    let transport = ScriptedTransport::new([tool_turn(&[(
        "call_1",
        "Designer",
        handoff_args("Designer").as_str(),
    )])]);
    let orchestrator = orchestrator(transport.clone(), no_tools());

    let response = orchestrator
        .run(RunRequest::new("Engineer", hello()).with_execute_tools(false))
        .await
        .unwrap()
        .response()
        .await
        .unwrap();

    assert_eq!(response.messages.len(), 1);
    assert_eq!(response.messages[0].calls().len(), 1);
    assert_eq!(response.agent.name, "Engineer");
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn default_turn_cap_allows_one_follow_up_round() {
    let transport = ScriptedTransport::new([
        tool_turn(&[("call_1", "DesignMode", r#"{"mode":"a"}"#)]),
        tool_turn(&[("call_2", "DesignMode", r#"{"mode":"b"}"#)]),
        text_turn("never requested"),
    ]);
    let orchestrator = orchestrator(transport.clone(), no_tools());

    let response = orchestrator
        .run(RunRequest::new("Engineer", hello()))
        .await
        .unwrap()
        .response()
        .await
        .unwrap();

    assert_eq!(transport.requests().len(), 2);
    let last = response.messages.last().unwrap();
    assert_eq!(last, &Message::tool_result("call_2", ""));
}

#[tokio::test]
async fn zero_turn_cap_behaves_like_one() {
    let transport = ScriptedTransport::new([
        tool_turn(&[("call_1", "DesignMode", r#"{"mode":"a"}"#)]),
        text_turn("never requested"),
    ]);
    let orchestrator = orchestrator(transport.clone(), no_tools());

    let response = orchestrator
        .run(RunRequest::new("Engineer", hello()).with_max_turns(0))
        .await
        .unwrap()
        .response()
        .await
        .unwrap();

    assert_eq!(transport.requests().len(), 1);
    assert_eq!(response.messages.len(), 2);
}

#[tokio::test]
async fn model_override_applies_to_every_round() {
    let transport = ScriptedTransport::new([
        tool_turn(&[("call_1", "Designer", handoff_args("Designer").as_str())]),
        text_turn("ok"),
    ]);
    let orchestrator = orchestrator(transport.clone(), no_tools());

    orchestrator
        .run(RunRequest::new("Engineer", hello()).with_model_override("tiny-model"))
        .await
        .unwrap()
        .response()
        .await
        .unwrap();

    let models: Vec<String> = transport.requests().into_iter().map(|r| r.model).collect();
    assert_eq!(models, vec!["tiny-model", "tiny-model"]);
}

#[tokio::test]
async fn events_arrive_in_turn_order_with_increasing_sequence() {
    let transport = ScriptedTransport::new([text_turn("hi there")]);
    let orchestrator = orchestrator(transport, no_tools());

    let handle = orchestrator.run(RunRequest::new("Engineer", hello())).await.unwrap();
    let run_id = handle.run_id();
    let (events, err) = collect(handle).await;
    assert!(err.is_none());

    let payloads = payloads(&events);
    assert_eq!(
        payloads.first(),
        Some(&&StreamEvent::TurnStart {
            turn: 1,
            agent: "Engineer".into()
        })
    );
    let text: String = payloads
        .iter()
        .filter_map(|p| match p {
            StreamEvent::TextDelta { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "hi there");
    assert!(matches!(
        payloads[payloads.len() - 2],
        StreamEvent::TurnEnd { turn: 1, .. }
    ));
    assert!(matches!(payloads.last(), Some(StreamEvent::Response { .. })));

    assert!(events.iter().all(|e| e.run_id == run_id));
    assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));
}

#[tokio::test]
async fn tool_call_fragments_are_forwarded_as_received() {
    let transport = ScriptedTransport::new([
        tool_turn(&[("call_1", "DesignMode", r#"{"mode":"a"}"#)]),
        text_turn("ok"),
    ]);
    let orchestrator = orchestrator(transport, no_tools());

    let handle = orchestrator.run(RunRequest::new("Engineer", hello())).await.unwrap();
    let (events, _) = collect(handle).await;

    let fragments: Vec<ToolCallDelta> = payloads(&events)
        .into_iter()
        .filter_map(|p| match p {
            StreamEvent::ToolCallDeltas { deltas } => Some(deltas.clone()),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(
        fragments,
        vec![
            ToolCallDelta::start(0, "call_1", "DesignMode", ""),
            ToolCallDelta::append(0, r#"{"mode"#),
            ToolCallDelta::append(0, r#"":"a"}"#),
        ]
    );
}

#[tokio::test]
async fn unknown_starting_agent_is_rejected_up_front() {
    let transport = ScriptedTransport::new([text_turn("unused")]);
    let orchestrator = orchestrator(transport.clone(), no_tools());

    let err = orchestrator
        .start(RunRequest::new("Nobody", hello()))
        .await
        .unwrap_err();

    assert!(matches!(err, BatonError::UnknownAgent(name) if name == "Nobody"));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn transport_failure_ends_the_stream_without_a_response() {
    let transport = ScriptedTransport::new([Script::Fail(BatonError::api(500, "boom"))]);
    let orchestrator = orchestrator(transport, no_tools());

    let handle = orchestrator.run(RunRequest::new("Engineer", hello())).await.unwrap();
    let (events, err) = collect(handle).await;

    assert!(matches!(err, Some(BatonError::Api { status: 500, .. })));
    assert!(events
        .iter()
        .all(|e| !matches!(e.event, StreamEvent::Response { .. })));
}

#[tokio::test]
async fn mid_stream_failure_keeps_delivered_fragments() {
    let transport = ScriptedTransport::new([Script::Deltas(vec![
        Ok(CompletionDelta::text("partial")),
        Err(BatonError::Transport("connection reset".into())),
    ])]);
    let orchestrator = orchestrator(transport, no_tools());

    let handle = orchestrator.run(RunRequest::new("Engineer", hello())).await.unwrap();
    let (events, err) = collect(handle).await;

    assert!(matches!(err, Some(BatonError::Transport(_))));
    assert!(payloads(&events).contains(&&StreamEvent::TextDelta {
        text: "partial".into()
    }));
}

#[tokio::test]
async fn tool_error_aborts_the_run() {
    let registry = ToolRegistry::new().with_tool(FunctionTool::new("remember", |_, _| async {
        Err::<ToolOutput, _>(BatonError::tool("remember", "disk full"))
    }));
    let transport = ScriptedTransport::new([
        tool_turn(&[("call_1", "remember", r#"{"fact":"x"}"#)]),
        text_turn("never requested"),
    ]);
    let orchestrator = orchestrator(transport.clone(), Arc::new(registry));

    let err = orchestrator
        .run(RunRequest::new("Engineer", hello()))
        .await
        .unwrap()
        .response()
        .await
        .unwrap_err();

    assert!(matches!(err, BatonError::ToolExecution { ref tool_name, .. } if tool_name == "remember"));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn cancel_ends_the_stream_with_canceled() {
    let transport = ScriptedTransport::new([Script::Hang(vec![CompletionDelta::text("thinking")])]);
    let orchestrator = orchestrator(transport, no_tools());

    let mut handle = orchestrator.run(RunRequest::new("Engineer", hello())).await.unwrap();
    loop {
        let event = futures::StreamExt::next(&mut handle).await.unwrap().unwrap();
        if matches!(event.event, StreamEvent::TextDelta { .. }) {
            break;
        }
    }
    handle.cancel();
    assert!(handle.is_canceled());

    let (events, err) = collect(&mut handle).await;
    assert!(events.is_empty());
    assert!(matches!(err, Some(BatonError::Canceled)));
}
