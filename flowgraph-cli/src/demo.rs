//! The car-description workflow: a supervisor delegating to two collector
//! workers, then a node that combines their answers.
//!
//! Graph shape: `init` → `delegate` (supervisor sub-graph over the colour and
//! speed collectors) → `assemble`. The collectors ask the user for missing
//! fields, which suspends the run; the binary answers prompts from stdin and
//! resumes.
//!
//! Ships deterministic rule-based models so the demo runs without any API
//! key; with the `openai` feature the same workflow runs on real models.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use flowgraph::{
    ChatModel, CollectorBuilder, CompilationError, CompiledGraph, FnNode, Message, Role, RunError,
    StateGraph, StateRecord, StateSchema, StateUpdate, SupervisorBuilder, ToolCallRequest, END,
    START,
};

#[cfg(feature = "openai")]
use flowgraph::{collector_registry, handoff_tool_specs, ChatOpenAI};

#[cfg(feature = "openai")]
use crate::config::ModelConfig;

/// The three models driving the workflow.
pub struct CarModels {
    pub supervisor: Arc<dyn ChatModel>,
    pub color: Arc<dyn ChatModel>,
    pub speed: Arc<dyn ChatModel>,
}

/// Channel set of the whole workflow.
pub fn car_schema() -> Arc<StateSchema> {
    Arc::new(
        StateSchema::builder()
            .messages("messages")
            .messages("messagesColor")
            .messages("messagesSpeed")
            .text("halfSentence")
            .text("color")
            .text("speed")
            .text("fullSentence")
            .counter("remaining_steps")
            .build(),
    )
}

fn worker_schema(channel: &str, field: &str) -> Arc<StateSchema> {
    Arc::new(
        StateSchema::builder()
            .messages("messages")
            .messages(channel)
            .text(field)
            .build(),
    )
}

/// Initial state for a run: the user's request, empty fields, step budget.
pub fn initial_car_state(message: &str, budget: i64) -> StateUpdate {
    StateUpdate::new()
        .with_messages("messages", vec![Message::user(message)])
        .with_text("halfSentence", "The car is ")
        .with_text("color", "")
        .with_text("speed", "")
        .with_text("fullSentence", "")
        .with_counter("remaining_steps", budget)
}

/// Builds the compiled workflow from the given models.
pub fn build_car_workflow(models: CarModels) -> Result<CompiledGraph, CompilationError> {
    let schema = car_schema();

    let color_worker = CollectorBuilder::new(
        "color_agent",
        "color",
        worker_schema("messagesColor", "color"),
        "messagesColor",
        "messages",
        models.color,
    )
    .with_label("colour")
    .build()?;

    let speed_worker = CollectorBuilder::new(
        "speed_agent",
        "speed",
        worker_schema("messagesSpeed", "speed"),
        "messagesSpeed",
        "messages",
        models.speed,
    )
    .build()?;

    let supervisor_schema = Arc::new(
        StateSchema::builder()
            .messages("messages")
            .messages("messagesColor")
            .messages("messagesSpeed")
            .text("color")
            .text("speed")
            .build(),
    );
    let supervisor = SupervisorBuilder::new(
        "supervisor",
        supervisor_schema,
        "messages",
        models.supervisor,
        "You manage two specialists:\n\
         - color_agent knows the car's colour\n\
         - speed_agent knows the car's speed\n\
         Whatever the user says, delegate: first `transfer_to_color_agent`, \
         wait for its report, then `transfer_to_speed_agent`, wait, and only \
         then summarise. Do not answer the user directly until both \
         specialists have reported.",
    )
    .add_worker("color_agent", Arc::new(color_worker))
    .add_worker("speed_agent", Arc::new(speed_worker))
    .build()?;

    let mut graph = StateGraph::new("car", schema);
    graph.add_node(
        "init",
        Arc::new(FnNode::new(|state: &StateRecord| {
            let mut update = StateUpdate::new();
            if state.text("halfSentence").is_empty() {
                update = update.with_text("halfSentence", "The car is ");
            }
            Ok(update)
        })),
    );
    graph.add_node("delegate", Arc::new(supervisor));
    graph.add_node(
        "assemble",
        Arc::new(FnNode::new(|state: &StateRecord| {
            let color = state.text("color").trim().to_string();
            let speed = state.text("speed").trim().to_string();
            if color.is_empty() {
                return Err(RunError::ExecutionFailed(
                    "assemble: 'color' must be non-empty".into(),
                ));
            }
            if speed.is_empty() {
                return Err(RunError::ExecutionFailed(
                    "assemble: 'speed' must be non-empty".into(),
                ));
            }
            let sentence = format!("{}{} and {}", state.text("halfSentence"), color, speed);
            tracing::info!(sentence = %sentence, "assembled");
            let mut update = StateUpdate::new().with_text("fullSentence", sentence.clone());
            update.push_message(
                "messages",
                Message::system(format!("combined into '{}'", sentence)),
            );
            Ok(update)
        })),
    );
    graph.add_edge(START, "init");
    graph.add_edge("init", "delegate");
    graph.add_edge("delegate", "assemble");
    graph.add_edge("assemble", END);
    graph.compile()
}

/// Deterministic collector policy: check the field, ask when empty, store the
/// answer, confirm. Stands in for a real model in `--mock` mode.
struct RuleCollectorModel {
    field: String,
    question: String,
}

#[async_trait]
impl ChatModel for RuleCollectorModel {
    async fn invoke(&self, messages: &[Message]) -> Result<Message, RunError> {
        let last_tool = match messages.last() {
            Some(m) if m.role == Role::Tool => Some(m),
            _ => None,
        };
        let reply = match last_tool {
            None => Message::assistant("").with_tool_calls(vec![ToolCallRequest::new(
                "get_field",
                json!({ "key": self.field }),
            )]),
            Some(result) => match result.name.as_deref() {
                Some("get_field") if result.content.is_empty() => Message::assistant("")
                    .with_tool_calls(vec![ToolCallRequest::new(
                        "ask_user",
                        json!({ "prompt": self.question }),
                    )]),
                Some("ask_user") => Message::assistant("").with_tool_calls(vec![
                    ToolCallRequest::new(
                        "set_field",
                        json!({ "key": self.field, "value": result.content }),
                    ),
                ]),
                // Field already present, or the write just confirmed: done.
                _ => Message::assistant(format!("The {} is settled.", self.field)),
            },
        };
        Ok(reply)
    }
}

/// Deterministic supervisor policy: delegate to the first worker without a
/// report, summarise once all have reported.
struct RuleSupervisorModel {
    workers: Vec<String>,
}

#[async_trait]
impl ChatModel for RuleSupervisorModel {
    async fn invoke(&self, messages: &[Message]) -> Result<Message, RunError> {
        let reported = |worker: &str| {
            messages.iter().any(|m| {
                m.role == Role::Assistant
                    && m.name.as_deref() == Some(worker)
                    && m.content.contains("has chosen the")
            })
        };
        for worker in &self.workers {
            if !reported(worker) {
                return Ok(Message::assistant("").with_tool_calls(vec![
                    ToolCallRequest::new(format!("transfer_to_{}", worker), json!({})),
                ]));
            }
        }
        Ok(Message::assistant(
            "Both specialists have reported; combining their answers.",
        ))
    }
}

/// Rule-based models for `--mock` mode: no API key, fully deterministic.
pub fn mock_models() -> CarModels {
    CarModels {
        supervisor: Arc::new(RuleSupervisorModel {
            workers: vec!["color_agent".into(), "speed_agent".into()],
        }),
        color: Arc::new(RuleCollectorModel {
            field: "color".into(),
            question: "What colour should the car be?".into(),
        }),
        speed: Arc::new(RuleCollectorModel {
            field: "speed".into(),
            question: "How fast should the car be?".into(),
        }),
    }
}

/// Real models over the OpenAI API, each bound with exactly its tool set.
#[cfg(feature = "openai")]
pub fn openai_models(config: &ModelConfig) -> CarModels {
    let supervisor = ChatOpenAI::new(config.model.clone())
        .with_temperature(config.temperature)
        .with_tools(handoff_tool_specs(["color_agent", "speed_agent"]));
    let color = ChatOpenAI::new(config.model.clone())
        .with_temperature(config.temperature)
        .with_tools(
            collector_registry(&worker_schema("messagesColor", "color"), "messagesColor").specs(),
        );
    let speed = ChatOpenAI::new(config.model.clone())
        .with_temperature(config.temperature)
        .with_tools(
            collector_registry(&worker_schema("messagesSpeed", "speed"), "messagesSpeed").specs(),
        );
    CarModels {
        supervisor: Arc::new(supervisor),
        color: Arc::new(color),
        speed: Arc::new(speed),
    }
}
