//! State graph: nodes + edges, compile and run.
//!
//! Build with [`StateGraph`]: add nodes, static edges and conditional edges
//! (using [`START`] and [`END`] sentinels), then `compile()` into a
//! [`CompiledGraph`]. The compiled graph drives super-steps — run the current
//! node, merge its partial update through the schema's reducers, decrement
//! the step budget, route — until a sink is reached, the run suspends for
//! external input, or a fatal error fails it. A compiled graph is itself a
//! [`Node`], which is how sub-graph delegation composes.

mod agent_node;
mod compile_error;
mod compiled;
mod conditional;
mod logging;
mod node;
mod run_context;
mod state_graph;
mod tools_node;

pub use agent_node::AgentNode;
pub use compile_error::CompilationError;
pub use compiled::{CompiledGraph, RunOutcome};
pub use conditional::{tools_condition, ConditionalRouter, RouterFn};
pub use node::{Continuation, FnNode, Node, NodeOutput, ResumePoint};
pub use run_context::RunContext;
pub use state_graph::{StateGraph, END, START};
pub use tools_node::ToolsNode;
