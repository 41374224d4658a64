//! Compiled state graph: immutable, runnable plan.
//!
//! Built by [`StateGraph::compile`](super::StateGraph::compile). The run loop
//! drives super-steps — execute the current node, merge its partial update
//! through the schema's reducers, apply the step-budget decrement, route —
//! until a sink or END is reached, a node suspends for external input, or a
//! fatal error fails the run. Failures never panic out of the loop: every
//! terminal carries the last stable state snapshot.
//!
//! A `CompiledGraph` is itself a [`Node`], so a whole compiled graph can be
//! added to another graph for hierarchical delegation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RunError;
use crate::state::{StateRecord, StateSchema};
use crate::tool::Interrupt;

use super::conditional::ConditionalRouter;
use super::logging::{
    log_complete, log_failed, log_resume, log_step_complete, log_step_start, log_suspend,
};
use super::node::{Continuation, Node, NodeOutput, ResumePoint};
use super::run_context::RunContext;
use super::state_graph::END;

/// How to pick the node after a given node runs.
pub(super) enum NextEntry {
    /// Single fixed next node (or END).
    Unconditional(String),
    /// Next node decided by the router from the merged state.
    Conditional(ConditionalRouter),
}

/// Terminal state of one `invoke`/`resume` drive of a graph.
///
/// Every variant carries the state snapshot at its point: the final state on
/// completion, the merged-so-far state on suspension, and the last stable
/// state on failure (a failing step's update is never applied).
#[derive(Debug)]
pub enum RunOutcome {
    Complete(StateRecord),
    Suspended {
        state: StateRecord,
        interrupt: Interrupt,
        continuation: Continuation,
    },
    Failed {
        state: StateRecord,
        error: RunError,
    },
}

/// Immutable executable graph. Cheap to clone; shared by runs.
#[derive(Clone)]
pub struct CompiledGraph {
    name: String,
    schema: Arc<StateSchema>,
    nodes: HashMap<String, Arc<dyn Node>>,
    first: String,
    next_map: Arc<HashMap<String, NextEntry>>,
}

impl CompiledGraph {
    pub(super) fn new(
        name: String,
        schema: Arc<StateSchema>,
        nodes: HashMap<String, Arc<dyn Node>>,
        first: String,
        next_map: HashMap<String, NextEntry>,
    ) -> Self {
        Self {
            name,
            schema,
            nodes,
            first,
            next_map: Arc::new(next_map),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Channel set this graph declares; also the view it receives as a sub-graph.
    pub fn schema(&self) -> &Arc<StateSchema> {
        &self.schema
    }

    /// Runs the graph from its entry node against the given state.
    pub async fn invoke(&self, state: StateRecord, ctx: &RunContext) -> RunOutcome {
        self.run_loop(state, self.first.clone(), None, ctx).await
    }

    /// Continues a suspended drive: re-enters the recorded node with the
    /// external reply, then keeps stepping as usual.
    pub async fn resume(
        &self,
        state: StateRecord,
        continuation: Continuation,
        reply: String,
        ctx: &RunContext,
    ) -> RunOutcome {
        let node_id = continuation.node_id.clone();
        self.run_loop(state, node_id, Some((continuation.resume, reply)), ctx)
            .await
    }

    /// Returns the budget error when any initialised counter channel is spent.
    fn budget_exhausted(&self, state: &StateRecord, steps: u64) -> Option<RunError> {
        for counter in self.schema.counters() {
            if state.get(counter).is_some() && state.counter(counter) <= 0 {
                return Some(RunError::BudgetExhausted { steps });
            }
        }
        None
    }

    async fn run_loop(
        &self,
        mut state: StateRecord,
        mut current: String,
        mut pending_resume: Option<(ResumePoint, String)>,
        ctx: &RunContext,
    ) -> RunOutcome {
        let mut steps: u64 = 0;
        loop {
            // Step boundary: cooperative cancellation, then budget.
            if ctx.is_cancelled() {
                log_failed(&self.name, &RunError::Cancelled);
                return RunOutcome::Failed {
                    state,
                    error: RunError::Cancelled,
                };
            }
            if ctx.is_root() {
                if let Some(error) = self.budget_exhausted(&state, steps) {
                    log_failed(&self.name, &error);
                    return RunOutcome::Failed { state, error };
                }
            }

            let Some(node) = self.nodes.get(&current) else {
                let error =
                    RunError::ExecutionFailed(format!("unknown node `{}` in plan", current));
                log_failed(&self.name, &error);
                return RunOutcome::Failed { state, error };
            };
            log_step_start(&self.name, &current, steps);

            let result = match pending_resume.take() {
                Some((resume, reply)) => {
                    log_resume(&self.name, &current);
                    node.resume(&state, resume, reply, ctx).await
                }
                None => node.run(&state, ctx).await,
            };
            let output = match result {
                Ok(output) => output,
                Err(error) => {
                    log_failed(&self.name, &error);
                    return RunOutcome::Failed { state, error };
                }
            };

            match output {
                NodeOutput::Suspend {
                    update,
                    interrupt,
                    resume,
                } => {
                    // Merge what the node produced before halting, then park.
                    state = match self.schema.merge(&state, &[update]) {
                        Ok(next) => next,
                        Err(error) => {
                            log_failed(&self.name, &error);
                            return RunOutcome::Failed { state, error };
                        }
                    };
                    log_suspend(&self.name, &current, &interrupt);
                    return RunOutcome::Suspended {
                        state,
                        interrupt,
                        continuation: Continuation {
                            node_id: current,
                            resume,
                        },
                    };
                }
                NodeOutput::Update(update) => {
                    state = match self.schema.merge(&state, &[update]) {
                        Ok(next) => next,
                        Err(error) => {
                            log_failed(&self.name, &error);
                            return RunOutcome::Failed { state, error };
                        }
                    };
                    steps += 1;
                    if ctx.is_root() {
                        state = self.schema.decrement_counters(&state);
                    }
                }
            }

            match self.next_map.get(&current) {
                None => {
                    // Sink: no outgoing route.
                    log_complete(&self.name, steps);
                    return RunOutcome::Complete(state);
                }
                Some(NextEntry::Unconditional(to)) => {
                    log_step_complete(&self.name, &current, to);
                    if to == END {
                        log_complete(&self.name, steps);
                        return RunOutcome::Complete(state);
                    }
                    current = to.clone();
                }
                Some(NextEntry::Conditional(router)) => {
                    let dest = router.resolve_next(&state);
                    log_step_complete(&self.name, &current, &dest);
                    if dest == END {
                        log_complete(&self.name, steps);
                        return RunOutcome::Complete(state);
                    }
                    if !self.nodes.contains_key(&dest) {
                        let error = RunError::ExecutionFailed(format!(
                            "router from `{}` chose unknown node `{}`",
                            current, dest
                        ));
                        log_failed(&self.name, &error);
                        return RunOutcome::Failed { state, error };
                    }
                    current = dest;
                }
            }
        }
    }
}

/// A compiled graph used as a node of another graph (delegation).
///
/// Runs the inner graph to its own completion on a state view restricted to
/// the channels it declares, then folds its final state into the outer
/// partial update. Inner suspension propagates outward as a `Subgraph` resume
/// point; inner failure fails the outer step with the inner error.
#[async_trait]
impl Node for CompiledGraph {
    async fn run(&self, state: &StateRecord, ctx: &RunContext) -> Result<NodeOutput, RunError> {
        let view = self.schema.project(state);
        match self.invoke(view, &ctx.child()).await {
            RunOutcome::Complete(final_state) => Ok(NodeOutput::Update(final_state.into_update())),
            RunOutcome::Suspended {
                state,
                interrupt,
                continuation,
            } => Ok(NodeOutput::Suspend {
                update: state.into_update(),
                interrupt,
                resume: ResumePoint::Subgraph(Box::new(continuation)),
            }),
            RunOutcome::Failed { error, .. } => Err(error),
        }
    }

    async fn resume(
        &self,
        state: &StateRecord,
        resume: ResumePoint,
        reply: String,
        ctx: &RunContext,
    ) -> Result<NodeOutput, RunError> {
        let ResumePoint::Subgraph(inner) = resume else {
            return Err(RunError::ExecutionFailed(format!(
                "sub-graph `{}` received a foreign resume point",
                self.name
            )));
        };
        let view = self.schema.project(state);
        match CompiledGraph::resume(self, view, *inner, reply, &ctx.child()).await {
            RunOutcome::Complete(final_state) => Ok(NodeOutput::Update(final_state.into_update())),
            RunOutcome::Suspended {
                state,
                interrupt,
                continuation,
            } => Ok(NodeOutput::Suspend {
                update: state.into_update(),
                interrupt,
                resume: ResumePoint::Subgraph(Box::new(continuation)),
            }),
            RunOutcome::Failed { error, .. } => Err(error),
        }
    }
}
