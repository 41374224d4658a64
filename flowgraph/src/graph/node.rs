//! Graph node contract: state view in, explicit partial update out.
//!
//! Nodes never mutate the live record; they return a [`NodeOutput`] the
//! executor merges. A node that needs external input returns
//! `NodeOutput::Suspend` carrying an explicit, serde-serializable
//! [`ResumePoint`] — suspension is a first-class data value, not stack
//! unwinding.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RunError;
use crate::message::ToolCallRequest;
use crate::state::{StateRecord, StateUpdate};
use crate::tool::Interrupt;

use super::run_context::RunContext;

/// Where a suspended node continues when the reply arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResumePoint {
    /// A tool-dispatch node halted inside a batch: `calls[next]` is the
    /// suspended call; calls before it already ran and must not run again.
    ToolBatch {
        /// Message channel the dispatch operates on.
        channel: String,
        /// The full requested batch, in request order.
        calls: Vec<ToolCallRequest>,
        /// Index of the call awaiting the reply.
        next: usize,
    },
    /// A sub-graph node suspended somewhere inside the inner graph.
    Subgraph(Box<Continuation>),
}

/// Durable record of a suspended run's exact continuation point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Continuation {
    /// Node to re-enter on resume.
    pub node_id: String,
    pub resume: ResumePoint,
}

/// Result of one node execution.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutput {
    /// The node completed; merge this (possibly empty) partial update.
    Update(StateUpdate),
    /// The node halted for external input. `update` holds everything
    /// produced before the halt and is merged before the run suspends.
    Suspend {
        update: StateUpdate,
        interrupt: Interrupt,
        resume: ResumePoint,
    },
}

/// A unit of computation over the state record.
///
/// `run` executes exactly once per visit. `resume` is only reached on nodes
/// that previously suspended (tool dispatch, sub-graphs); everything else
/// keeps the default, which fails loudly rather than silently re-running.
#[async_trait]
pub trait Node: Send + Sync {
    async fn run(&self, state: &StateRecord, ctx: &RunContext) -> Result<NodeOutput, RunError>;

    /// Continues a suspended execution with the external reply.
    async fn resume(
        &self,
        state: &StateRecord,
        resume: ResumePoint,
        reply: String,
        ctx: &RunContext,
    ) -> Result<NodeOutput, RunError> {
        let _ = (state, resume, reply, ctx);
        Err(RunError::ExecutionFailed(
            "node does not support resumption".into(),
        ))
    }
}

/// Plain node from a pure transform: `&StateRecord → StateUpdate`.
///
/// The workhorse for init/report/assemble-style steps that neither call a
/// model nor dispatch tools.
#[derive(Clone)]
pub struct FnNode {
    f: Arc<dyn Fn(&StateRecord) -> Result<StateUpdate, RunError> + Send + Sync>,
}

impl FnNode {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&StateRecord) -> Result<StateUpdate, RunError> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }
}

#[async_trait]
impl Node for FnNode {
    async fn run(&self, state: &StateRecord, _ctx: &RunContext) -> Result<NodeOutput, RunError> {
        (self.f)(state).map(NodeOutput::Update)
    }
}
