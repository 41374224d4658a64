//! Supervisor pattern: delegate to worker sub-graphs, collect their reports.
//!
//! A supervisor is an LLM-backed node whose tool set is exactly "transfer
//! control to worker W" for each known worker — nothing else. Transfers are
//! interpreted by routing, not by tool execution: when the supervisor's last
//! message requests `transfer_to_<worker>`, control flows through a handoff
//! node (which appends the tool-role acknowledgement for the transfer call)
//! into that worker's compiled sub-graph, and from there back to the
//! supervisor. Each worker converses on its own private channel and, on
//! completion, publishes one summary message to the shared channel — the only
//! channel workers and supervisor have in common.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::RunError;
use crate::graph::{
    tools_condition, AgentNode, CompilationError, CompiledGraph, FnNode, Node, NodeOutput,
    RunContext, StateGraph, ToolsNode, END, START,
};
use crate::llm::ChatModel;
use crate::message::Message;
use crate::state::{StateRecord, StateSchema, StateUpdate};
use crate::tool::{AskUser, GetField, SetField, ToolRegistry, ToolSpec};

/// Name of the transfer tool for a worker (`transfer_to_<worker>`).
pub fn handoff_tool_name(worker: &str) -> String {
    format!("transfer_to_{}", worker)
}

/// Tool declarations a supervisor model is bound with: one argument-less
/// transfer tool per worker, and nothing else.
pub fn handoff_tool_specs<'a>(workers: impl IntoIterator<Item = &'a str>) -> Vec<ToolSpec> {
    workers
        .into_iter()
        .map(|worker| ToolSpec {
            name: handoff_tool_name(worker),
            description: format!(
                "Transfer control to the {} worker and wait for its report.",
                worker
            ),
            parameters: json!({"type": "object", "properties": {}}),
        })
        .collect()
}

/// Appends the tool-role acknowledgement for a transfer call, keeping the
/// shared conversation well-formed before the worker runs.
struct HandoffNode {
    worker: String,
    channel: String,
}

#[async_trait]
impl Node for HandoffNode {
    async fn run(&self, state: &StateRecord, _ctx: &RunContext) -> Result<NodeOutput, RunError> {
        let tool_name = handoff_tool_name(&self.worker);
        let call_id = state
            .last_message(&self.channel)
            .and_then(|msg| msg.tool_calls.iter().find(|c| c.name == tool_name))
            .map(|c| c.id.clone())
            .ok_or_else(|| {
                RunError::ExecutionFailed(format!(
                    "no pending transfer call for worker `{}`",
                    self.worker
                ))
            })?;
        tracing::info!(worker = %self.worker, "handing off");
        let mut update = StateUpdate::new();
        update.push_message(
            &self.channel,
            Message::tool(format!("Transferred to {}.", self.worker), call_id)
                .with_name(&tool_name),
        );
        Ok(NodeOutput::Update(update))
    }
}

/// Builds the supervisor graph: supervisor agent, handoff routing, workers.
///
/// The returned graph is itself a sub-graph candidate — in the car workflow
/// it runs as the `delegate` node of the parent graph.
pub struct SupervisorBuilder {
    name: String,
    schema: Arc<StateSchema>,
    channel: String,
    model: Arc<dyn ChatModel>,
    prompt: String,
    workers: Vec<(String, Arc<CompiledGraph>)>,
}

impl SupervisorBuilder {
    /// `channel` is the shared message channel the supervisor converses on;
    /// `model` must be bound with [`handoff_tool_specs`] for the workers
    /// added below.
    pub fn new(
        name: impl Into<String>,
        schema: Arc<StateSchema>,
        channel: impl Into<String>,
        model: Arc<dyn ChatModel>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            schema,
            channel: channel.into(),
            model,
            prompt: prompt.into(),
            workers: Vec::new(),
        }
    }

    /// Adds a worker sub-graph reachable via `transfer_to_<name>`.
    pub fn add_worker(mut self, name: impl Into<String>, graph: Arc<CompiledGraph>) -> Self {
        self.workers.push((name.into(), graph));
        self
    }

    pub fn build(self) -> Result<CompiledGraph, CompilationError> {
        let mut graph = StateGraph::new(self.name.clone(), self.schema);
        graph.add_node(
            "supervisor",
            Arc::new(AgentNode::new(
                self.name,
                self.prompt,
                self.channel.clone(),
                self.model,
            )),
        );
        graph.add_edge(START, "supervisor");

        let worker_names: Vec<String> = self.workers.iter().map(|(n, _)| n.clone()).collect();
        let mut path_map = HashMap::new();
        for (worker, compiled) in self.workers {
            let handoff_id = format!("handoff_{}", worker);
            path_map.insert(worker.clone(), handoff_id.clone());
            graph.add_node(
                &handoff_id,
                Arc::new(HandoffNode {
                    worker: worker.clone(),
                    channel: self.channel.clone(),
                }),
            );
            graph.add_node(&worker, compiled);
            graph.add_edge(&handoff_id, &worker);
            graph.add_edge(&worker, "supervisor");
        }

        // Route on the supervisor's own last message: the first transfer call
        // naming a known worker wins; no calls means the final answer.
        let channel = self.channel;
        graph.add_conditional_edges(
            "supervisor",
            Arc::new(move |state: &StateRecord| {
                if let Some(msg) = state.last_message(&channel) {
                    for call in &msg.tool_calls {
                        for worker in &worker_names {
                            if call.name == handoff_tool_name(worker) {
                                return worker.clone();
                            }
                        }
                    }
                }
                END.to_string()
            }),
            Some(path_map),
        );

        graph.compile()
    }
}

/// Builds a field-collector worker: an agent loop that checks a state field,
/// asks the user when it is empty, stores the answer, and reports.
///
/// Graph shape: `llm` ⇄ `tools` under [`tools_condition`], then `report`.
/// The same private channel feeds the agent node, the router and the
/// dispatch node, so the three can never disagree about which conversation
/// they operate on.
pub struct CollectorBuilder {
    name: String,
    field: String,
    label: String,
    schema: Arc<StateSchema>,
    channel: String,
    shared_channel: String,
    model: Arc<dyn ChatModel>,
    prompt: Option<String>,
}

impl CollectorBuilder {
    /// `schema` is the worker's own channel set (its sub-graph view);
    /// `channel` its private conversation; `shared_channel` where the public
    /// summary goes. `model` must be bound with the specs of
    /// [`collector_registry`] for this worker.
    pub fn new(
        name: impl Into<String>,
        field: impl Into<String>,
        schema: Arc<StateSchema>,
        channel: impl Into<String>,
        shared_channel: impl Into<String>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        let field = field.into();
        Self {
            name: name.into(),
            label: field.clone(),
            field,
            schema,
            channel: channel.into(),
            shared_channel: shared_channel.into(),
            model,
            prompt: None,
        }
    }

    /// Human wording for the field in prompts and reports (e.g. "colour" for
    /// the `color` field). Defaults to the field name.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Replaces the generated system prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    fn default_prompt(&self) -> String {
        format!(
            "You are a car-{label} information collector.\n\
             First call the `get_field` tool with {{\"key\": \"{field}\"}} to see if a \
             value is already stored.\n\
             - If the returned value is non-empty, your job is done: answer with a \
             short confirmation and no tool calls.\n\
             - Otherwise, call the `ask_user` tool to ask the user for the {label}.\n\
             After the user replies, call `set_field` with \
             {{\"key\": \"{field}\", \"value\": \"<their answer>\"}}.\n\
             Once the value is stored, answer with a short confirmation and no tool calls.",
            label = self.label,
            field = self.field,
        )
    }

    pub fn build(self) -> Result<CompiledGraph, CompilationError> {
        let prompt = self
            .prompt
            .clone()
            .unwrap_or_else(|| self.default_prompt());
        let registry = Arc::new(collector_registry(&self.schema, &self.channel));

        let mut graph = StateGraph::new(self.name.clone(), self.schema);
        graph.add_node(
            "llm",
            Arc::new(AgentNode::new(
                self.name.clone(),
                prompt,
                self.channel.clone(),
                self.model,
            )),
        );
        graph.add_node("tools", Arc::new(ToolsNode::new(registry, self.channel.clone())));

        let name = self.name;
        let field = self.field;
        let label = self.label;
        let channel = self.channel.clone();
        let shared = self.shared_channel;
        graph.add_node(
            "report",
            Arc::new(FnNode::new(move |state: &StateRecord| {
                let value = state.text(&field);
                if value.is_empty() {
                    // Nothing chosen yet; nothing to report.
                    return Ok(StateUpdate::new());
                }
                let public = Message::assistant(format!(
                    "{} has chosen the {}: {}",
                    name, label, value
                ))
                .with_name(&name);
                let mut update =
                    StateUpdate::new().with_messages(&shared, vec![public.clone()]);
                update.push_message(&channel, public);
                Ok(update)
            })),
        );

        graph.add_edge(START, "llm");
        graph.add_conditional_edges(
            "llm",
            tools_condition(self.channel),
            Some(HashMap::from([
                ("tools".to_string(), "tools".to_string()),
                (END.to_string(), "report".to_string()),
            ])),
        );
        graph.add_edge("tools", "llm");
        // `report` has no outgoing edge: it is the worker's sink.

        graph.compile()
    }
}

/// The collector's closed tool set on its private channel: read the field,
/// write it (validated against `schema`), ask the user.
pub fn collector_registry(schema: &Arc<StateSchema>, channel: &str) -> ToolRegistry {
    ToolRegistry::new()
        .register(Arc::new(GetField::new(channel)))
        .register(Arc::new(SetField::new(schema.clone(), channel)))
        .register(Arc::new(AskUser::new(channel)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RunOutcome;
    use crate::llm::ScriptedChatModel;
    use crate::message::{Role, ToolCallRequest};

    fn worker_schema() -> Arc<StateSchema> {
        Arc::new(
            StateSchema::builder()
                .messages("messages")
                .messages("messagesColor")
                .text("color")
                .build(),
        )
    }

    /// **Scenario**: handoff specs declare exactly one transfer tool per worker.
    #[test]
    fn handoff_specs_one_per_worker() {
        let specs = handoff_tool_specs(["color_agent", "speed_agent"]);
        let names: Vec<_> = specs.iter().map(|s| s.name.clone()).collect();
        assert_eq!(
            names,
            vec!["transfer_to_color_agent", "transfer_to_speed_agent"]
        );
    }

    /// **Scenario**: a collector whose field is already set confirms without
    /// asking and publishes its report to the shared channel.
    #[tokio::test]
    async fn collector_skips_ask_when_field_present() {
        let schema = worker_schema();
        let model = Arc::new(ScriptedChatModel::new(vec![
            Message::assistant("").with_tool_calls(vec![ToolCallRequest::new(
                "get_field",
                json!({"key": "color"}),
            )]),
            Message::assistant("color already known"),
        ]));
        let worker = CollectorBuilder::new(
            "color_agent",
            "color",
            schema.clone(),
            "messagesColor",
            "messages",
            model,
        )
        .with_label("colour")
        .build()
        .unwrap();

        let initial = schema
            .merge(
                &StateRecord::new(),
                &[StateUpdate::new().with_text("color", "red")],
            )
            .unwrap();
        match worker.invoke(initial, &RunContext::default()).await {
            RunOutcome::Complete(state) => {
                let report = state.last_message("messages").unwrap();
                assert_eq!(report.content, "color_agent has chosen the colour: red");
                assert_eq!(report.name.as_deref(), Some("color_agent"));
                // The report is mirrored into the private channel.
                let private = state.last_message("messagesColor").unwrap();
                assert_eq!(private.id, report.id);
            }
            other => panic!("expected Complete, got {:?}", other),
        }
    }

    /// **Scenario**: the supervisor routes a transfer call through the handoff
    /// node into the worker and appends the acknowledgement.
    #[tokio::test]
    async fn supervisor_routes_transfer_to_worker() {
        let schema = worker_schema();

        let worker_model = Arc::new(ScriptedChatModel::new(vec![Message::assistant(
            "nothing to do",
        )]));
        let worker = CollectorBuilder::new(
            "color_agent",
            "color",
            schema.clone(),
            "messagesColor",
            "messages",
            worker_model,
        )
        .build()
        .unwrap();

        let supervisor_model = Arc::new(ScriptedChatModel::new(vec![
            Message::assistant("").with_tool_calls(vec![ToolCallRequest::new(
                "transfer_to_color_agent",
                json!({}),
            )]),
            Message::assistant("all reports in"),
        ]));
        let supervisor = SupervisorBuilder::new(
            "supervisor",
            schema.clone(),
            "messages",
            supervisor_model,
            "Delegate, then summarise.",
        )
        .add_worker("color_agent", Arc::new(worker))
        .build()
        .unwrap();

        let initial = schema
            .merge(
                &StateRecord::new(),
                &[StateUpdate::new()
                    .with_messages("messages", vec![Message::user("Describe the car.")])],
            )
            .unwrap();
        match supervisor.invoke(initial, &RunContext::default()).await {
            RunOutcome::Complete(state) => {
                let roles: Vec<Role> = state
                    .messages("messages")
                    .iter()
                    .map(|m| m.role)
                    .collect();
                // user, transfer request, handoff ack, final summary
                // (the worker reported nothing: its field was empty and its
                // model ended immediately).
                assert_eq!(
                    roles,
                    vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
                );
                let ack = &state.messages("messages")[2];
                assert_eq!(ack.content, "Transferred to color_agent.");
                assert_eq!(
                    state.last_message("messages").unwrap().content,
                    "all reports in"
                );
            }
            other => panic!("expected Complete, got {:?}", other),
        }
    }
}
