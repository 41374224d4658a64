//! Runner surface: submit/resume/inspect/cancel, durable resume via files.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use flowgraph::{
    tools_condition, AgentNode, Effect, FileSaver, FnNode, Interrupt, Message, RunError,
    RunStatus, Runner, ScriptedChatModel, StateGraph, StateRecord, StateSchema, StateUpdate,
    Tool, ToolCallRequest, ToolRegistry, ToolsNode, END, START,
};

/// Minimal suspending tool for runner-level tests.
struct Ask;

#[async_trait]
impl Tool for Ask {
    fn name(&self) -> &str {
        "ask"
    }
    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }
    async fn execute(&self, _: Value, _: &StateRecord, _: &str) -> Effect {
        Effect::Suspend(Interrupt::new("say something"))
    }
    async fn resume(&self, reply: String, _: Value, _: &StateRecord, call_id: &str) -> Effect {
        let mut update = StateUpdate::new();
        update.push_message("messages", Message::tool(reply, call_id));
        Effect::Update(update)
    }
}

fn suspending_graph() -> StateGraph {
    let schema = Arc::new(StateSchema::builder().messages("messages").build());
    let registry = Arc::new(ToolRegistry::new().register(Arc::new(Ask)));
    let model = Arc::new(ScriptedChatModel::new(vec![
        Message::assistant("").with_tool_calls(vec![ToolCallRequest::new("ask", json!({}))]),
        Message::assistant("thanks"),
    ]));
    let mut graph = StateGraph::new("asker", schema);
    graph.add_node(
        "llm",
        Arc::new(AgentNode::new("asker", "Ask once.", "messages", model)),
    );
    graph.add_node("tools", Arc::new(ToolsNode::new(registry, "messages")));
    graph.add_edge(START, "llm");
    graph.add_conditional_edges(
        "llm",
        tools_condition("messages"),
        Some(std::collections::HashMap::from([
            ("tools".to_string(), "tools".to_string()),
            (END.to_string(), END.to_string()),
        ])),
    );
    graph.add_edge("tools", "llm");
    graph
}

/// **Scenario**: a run suspended in one Runner resumes in a different Runner
/// over the same file-backed checkpointer — the different-process shape.
#[tokio::test]
async fn file_saver_resume_across_runners() {
    let dir = tempfile::tempdir().unwrap();

    let run_id = {
        let saver = Arc::new(FileSaver::new(dir.path()).unwrap());
        let mut runner = Runner::with_checkpointer(saver);
        runner.register_graph("asker", Arc::new(suspending_graph().compile().unwrap()));
        let handle = runner
            .run(
                "asker",
                StateUpdate::new().with_messages("messages", vec![Message::user("hi")]),
            )
            .await
            .unwrap();
        assert!(handle.status.is_awaiting_input());
        handle.run_id
    };

    // A fresh Runner with the same graphs and directory picks the run up.
    let saver = Arc::new(FileSaver::new(dir.path()).unwrap());
    let mut runner = Runner::with_checkpointer(saver);
    runner.register_graph("asker", Arc::new(suspending_graph().compile().unwrap()));
    let handle = runner.resume(&run_id, "hello from elsewhere").await.unwrap();
    assert_eq!(handle.status, RunStatus::Completed);

    let state = runner.get_state(&run_id).await.unwrap();
    assert!(state
        .messages("messages")
        .iter()
        .any(|m| m.content == "hello from elsewhere"));
}

/// **Scenario**: two independent runs of the same graph do not share state.
#[tokio::test]
async fn runs_are_isolated() {
    let schema = Arc::new(StateSchema::builder().text("who").build());
    let mut graph = StateGraph::new("echo", schema);
    graph.add_node(
        "copy",
        Arc::new(FnNode::new(|state: &StateRecord| {
            Ok(StateUpdate::new().with_text("who", format!("seen:{}", state.text("who"))))
        })),
    );
    graph.add_edge(START, "copy");
    let compiled = Arc::new(graph.compile().unwrap());

    let mut runner = Runner::new();
    runner.register_graph("echo", compiled);

    let a = runner
        .run("echo", StateUpdate::new().with_text("who", "a"))
        .await
        .unwrap();
    let b = runner
        .run("echo", StateUpdate::new().with_text("who", "b"))
        .await
        .unwrap();
    assert_ne!(a.run_id, b.run_id);
    assert_eq!(runner.get_state(&a.run_id).await.unwrap().text("who"), "seen:a");
    assert_eq!(runner.get_state(&b.run_id).await.unwrap().text("who"), "seen:b");
}

/// **Scenario**: cancelling a suspended run makes the eventual resume abort
/// at the next step boundary with `Cancelled`.
#[tokio::test]
async fn cancel_takes_effect_at_resume_boundary() {
    let mut runner = Runner::new();
    runner.register_graph("asker", Arc::new(suspending_graph().compile().unwrap()));
    let handle = runner
        .run(
            "asker",
            StateUpdate::new().with_messages("messages", vec![Message::user("hi")]),
        )
        .await
        .unwrap();
    assert!(handle.status.is_awaiting_input());

    runner.cancel(&handle.run_id);
    let handle = runner.resume(&handle.run_id, "too late").await.unwrap();
    assert_eq!(handle.status, RunStatus::Failed(RunError::Cancelled));
}

/// **Scenario**: a failed run reports its error kind and the last stable
/// state snapshot.
#[tokio::test]
async fn failed_run_reports_kind_and_snapshot() {
    let schema = Arc::new(StateSchema::builder().text("progress").build());
    let mut graph = StateGraph::new("fails", schema);
    graph.add_node(
        "first",
        Arc::new(FnNode::new(|_| {
            Ok(StateUpdate::new().with_text("progress", "halfway"))
        })),
    );
    graph.add_node(
        "bad",
        Arc::new(FnNode::new(|_| {
            Ok(StateUpdate::new().with_text("unknownField", "x"))
        })),
    );
    graph.add_edge(START, "first");
    graph.add_edge("first", "bad");
    graph.add_edge("bad", END);
    let mut runner = Runner::new();
    runner.register_graph("fails", Arc::new(graph.compile().unwrap()));

    let handle = runner.run("fails", StateUpdate::new()).await.unwrap();
    match &handle.status {
        RunStatus::Failed(RunError::SchemaViolation(msg)) => {
            assert!(msg.contains("unknownField"))
        }
        other => panic!("expected SchemaViolation failure, got {:?}", other),
    }
    // Prior state is intact: the bad update was never applied.
    let state = runner.get_state(&handle.run_id).await.unwrap();
    assert_eq!(state.text("progress"), "halfway");
}

/// **Scenario**: budget exhaustion surfaces as its own failure kind through
/// the Runner, distinguishable from other errors.
#[tokio::test]
async fn budget_exhaustion_is_distinct_failure() {
    let schema = Arc::new(
        StateSchema::builder()
            .text("x")
            .counter("remaining_steps")
            .build(),
    );
    let mut graph = StateGraph::new("spin", schema);
    graph.add_node("a", Arc::new(FnNode::new(|_| Ok(StateUpdate::new()))));
    graph.add_node("b", Arc::new(FnNode::new(|_| Ok(StateUpdate::new()))));
    graph.add_edge(START, "a");
    graph.add_edge("a", "b");
    graph.add_edge("b", "a");
    let mut runner = Runner::new();
    runner.register_graph("spin", Arc::new(graph.compile().unwrap()));

    let handle = runner
        .run("spin", StateUpdate::new().with_counter("remaining_steps", 6))
        .await
        .unwrap();
    assert_eq!(
        handle.status,
        RunStatus::Failed(RunError::BudgetExhausted { steps: 6 })
    );
}
