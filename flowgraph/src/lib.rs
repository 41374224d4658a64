//! # flowgraph
//!
//! Graph-structured agent orchestration in Rust: cooperating agent nodes run
//! over a shared, channelled state record, control routes on runtime
//! conditions, and a run can suspend mid-execution for external (human)
//! input and resume exactly where it left off.
//!
//! ## Design principles
//!
//! - **Channelled state**: one closed schema per graph; each channel has its
//!   own merge policy (append-with-upsert for message history, last-write-wins
//!   for scalars, budget semantics for counters). Nodes return partial
//!   updates; only the executor writes to the record.
//! - **Explicit effects**: tools answer with `Update` / `Suspend` / `Error`
//!   values. Suspension is data — the continuation is a serde value a
//!   checkpointer can persist and another process can resume.
//! - **Graphs compose**: a compiled graph is itself a node, which is how a
//!   supervisor delegates to worker sub-graphs over restricted state views.
//!
//! ## Main modules
//!
//! - [`state`]: `StateSchema`, `StateRecord`, `StateUpdate` — channels and reducers.
//! - [`graph`]: `StateGraph`, `CompiledGraph`, nodes and routers — build and run.
//! - [`tool`]: the tool calling convention and the built-in field/ask tools.
//! - [`llm`]: the `ChatModel` boundary with mock, scripted and OpenAI backends.
//! - [`run`]: `Runner` — submit, resume, inspect, cancel.
//! - [`memory`]: checkpoints and savers (in-memory, JSON files).
//! - [`supervisor`]: supervisor/worker delegation builders.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use flowgraph::{FnNode, Runner, StateGraph, StateSchema, StateUpdate, START};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let schema = Arc::new(StateSchema::builder().text("greeting").build());
//! let mut graph = StateGraph::new("hello", schema);
//! graph.add_node(
//!     "greet",
//!     Arc::new(FnNode::new(|_| {
//!         Ok(StateUpdate::new().with_text("greeting", "hello, world"))
//!     })),
//! );
//! graph.add_edge(START, "greet");
//!
//! let mut runner = Runner::new();
//! runner.register_graph("hello", Arc::new(graph.compile().unwrap()));
//! let handle = runner.run("hello", StateUpdate::new()).await.unwrap();
//! let state = runner.get_state(&handle.run_id).await.unwrap();
//! assert_eq!(state.text("greeting"), "hello, world");
//! # }
//! ```

pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod message;
pub mod run;
pub mod state;
pub mod supervisor;
pub mod tool;

pub use error::RunError;
pub use graph::{
    tools_condition, AgentNode, CompilationError, CompiledGraph, Continuation, FnNode, Node,
    NodeOutput, ResumePoint, RouterFn, RunContext, RunOutcome, StateGraph, ToolsNode, END, START,
};
pub use llm::{ChatModel, MockChatModel, ScriptedChatModel};
#[cfg(feature = "openai")]
pub use llm::ChatOpenAI;
pub use memory::{
    CheckpointError, Checkpointer, FileSaver, JsonSerializer, MemorySaver, RunCheckpoint,
    Serializer,
};
pub use message::{Message, Role, ToolCallRequest};
pub use run::{RunHandle, RunStatus, Runner};
pub use state::{ChannelKind, ChannelValue, StateRecord, StateSchema, StateUpdate};
pub use supervisor::{
    collector_registry, handoff_tool_name, handoff_tool_specs, CollectorBuilder, SupervisorBuilder,
};
pub use tool::{
    validate_arguments, AskUser, Effect, GetField, Interrupt, SetField, Tool, ToolRegistry,
    ToolSpec,
};
