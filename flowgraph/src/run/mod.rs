//! Run lifecycle: submit, resume, inspect, cancel.
//!
//! A [`Runner`] owns compiled graphs by id and is the only writer to run
//! state. `run` drives a fresh run until it completes, suspends for external
//! input, or fails; `resume` continues a suspended run with the reply;
//! `get_state` returns the state snapshot for any status. Every transition
//! is persisted through the configured [`Checkpointer`], so resumption can
//! happen arbitrarily later — and, with a durable saver, from a different
//! process.
//!
//! Runs are isolated: each has its own state record, and nodes within a run
//! execute strictly sequentially. Fanning out independent runs is the only
//! parallelism here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RunError;
use crate::graph::{CompiledGraph, RunContext, RunOutcome};
use crate::memory::{Checkpointer, MemorySaver, RunCheckpoint};
use crate::state::{StateRecord, StateUpdate};

/// Lifecycle state of a run.
///
/// `Pending` and `Running` are transient — [`Runner::run`] drives the run to
/// its first stable status before returning — but they are recorded so the
/// checkpointer reflects submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    /// Suspended; `prompt` is the exact text awaiting a reply.
    AwaitingInput { prompt: String },
    /// Terminated; the error kind distinguishes budget exhaustion from
    /// schema violations and other faults.
    Failed(RunError),
}

impl RunStatus {
    pub fn is_awaiting_input(&self) -> bool {
        matches!(self, RunStatus::AwaitingInput { .. })
    }
}

/// Handle returned by submit/resume: run id plus current status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHandle {
    pub run_id: String,
    pub status: RunStatus,
}

/// Owns graphs and run lifecycle; the external interface of the engine.
pub struct Runner {
    graphs: HashMap<String, Arc<CompiledGraph>>,
    saver: Arc<dyn Checkpointer>,
    /// Cooperative cancellation flags for runs driven by this process.
    cancel_flags: DashMap<String, Arc<AtomicBool>>,
}

impl Runner {
    /// Runner with an in-memory checkpointer.
    pub fn new() -> Self {
        Self::with_checkpointer(Arc::new(MemorySaver::new()))
    }

    /// Runner persisting through the given checkpointer.
    pub fn with_checkpointer(saver: Arc<dyn Checkpointer>) -> Self {
        Self {
            graphs: HashMap::new(),
            saver,
            cancel_flags: DashMap::new(),
        }
    }

    /// Registers a compiled graph under an id; replaces any previous one.
    pub fn register_graph(
        &mut self,
        graph_id: impl Into<String>,
        graph: Arc<CompiledGraph>,
    ) -> &mut Self {
        self.graphs.insert(graph_id.into(), graph);
        self
    }

    /// Submits a run: validates the initial state against the graph's
    /// schema, then drives the run to its first stable status.
    ///
    /// Unknown channels in `initial` fail with `SchemaViolation` before a run
    /// is created.
    pub async fn run(
        &self,
        graph_id: &str,
        initial: StateUpdate,
    ) -> Result<RunHandle, RunError> {
        let graph = self
            .graphs
            .get(graph_id)
            .ok_or_else(|| RunError::NoSuchGraph(graph_id.to_string()))?;
        let state = graph.schema().merge(&StateRecord::new(), &[initial])?;

        let run_id = Uuid::new_v4().to_string();
        tracing::info!(run_id = %run_id, graph_id, "run submitted");
        self.save(RunCheckpoint::new(
            &run_id,
            graph_id,
            RunStatus::Pending,
            state.clone(),
            None,
            0,
        ))
        .await;

        let ctx = RunContext::for_run(&run_id).with_cancel_flag(self.cancel_flag(&run_id));
        let outcome = graph.invoke(state, &ctx).await;
        self.settle(&run_id, graph_id, 1, outcome).await
    }

    /// Resumes a suspended run with the external reply.
    ///
    /// Fails with `NoSuchRun` for unknown ids and `NotAwaitingInput` when the
    /// run is in any other status.
    pub async fn resume(
        &self,
        run_id: &str,
        reply: impl Into<String>,
    ) -> Result<RunHandle, RunError> {
        let checkpoint = self
            .saver
            .get(run_id)
            .await
            .map_err(|e| RunError::ExecutionFailed(e.to_string()))?
            .ok_or_else(|| RunError::NoSuchRun(run_id.to_string()))?;
        if !checkpoint.status.is_awaiting_input() {
            return Err(RunError::NotAwaitingInput(run_id.to_string()));
        }
        let continuation = checkpoint
            .continuation
            .ok_or_else(|| RunError::NotAwaitingInput(run_id.to_string()))?;
        let graph = self
            .graphs
            .get(&checkpoint.graph_id)
            .ok_or_else(|| RunError::NoSuchGraph(checkpoint.graph_id.clone()))?;

        tracing::info!(run_id, graph_id = %checkpoint.graph_id, "run resuming");
        let ctx = RunContext::for_run(run_id).with_cancel_flag(self.cancel_flag(run_id));
        let outcome = graph
            .resume(checkpoint.state, continuation, reply.into(), &ctx)
            .await;
        self.settle(run_id, &checkpoint.graph_id, checkpoint.step + 1, outcome)
            .await
    }

    /// State snapshot at the run's current point, for any status.
    pub async fn get_state(&self, run_id: &str) -> Result<StateRecord, RunError> {
        let checkpoint = self
            .saver
            .get(run_id)
            .await
            .map_err(|e| RunError::ExecutionFailed(e.to_string()))?
            .ok_or_else(|| RunError::NoSuchRun(run_id.to_string()))?;
        Ok(checkpoint.state)
    }

    /// Current status of a run.
    pub async fn status(&self, run_id: &str) -> Result<RunStatus, RunError> {
        let checkpoint = self
            .saver
            .get(run_id)
            .await
            .map_err(|e| RunError::ExecutionFailed(e.to_string()))?
            .ok_or_else(|| RunError::NoSuchRun(run_id.to_string()))?;
        Ok(checkpoint.status)
    }

    /// Requests cooperative cancellation: the run aborts at its next step
    /// boundary. An in-flight node call is never interrupted.
    pub fn cancel(&self, run_id: &str) {
        self.cancel_flag(run_id).store(true, Ordering::Relaxed);
    }

    fn cancel_flag(&self, run_id: &str) -> Arc<AtomicBool> {
        self.cancel_flags
            .entry(run_id.to_string())
            .or_insert_with(|| Arc::new(AtomicBool::new(false)))
            .clone()
    }

    /// Maps an outcome to the run's next stable status and persists it.
    async fn settle(
        &self,
        run_id: &str,
        graph_id: &str,
        step: u64,
        outcome: RunOutcome,
    ) -> Result<RunHandle, RunError> {
        let (status, state, continuation) = match outcome {
            RunOutcome::Complete(state) => (RunStatus::Completed, state, None),
            RunOutcome::Suspended {
                state,
                interrupt,
                continuation,
            } => (
                RunStatus::AwaitingInput {
                    prompt: interrupt.prompt,
                },
                state,
                Some(continuation),
            ),
            RunOutcome::Failed { state, error } => (RunStatus::Failed(error), state, None),
        };
        if !matches!(status, RunStatus::AwaitingInput { .. }) {
            self.cancel_flags.remove(run_id);
        }
        tracing::info!(run_id, ?status, "run settled");
        self.save(RunCheckpoint::new(
            run_id,
            graph_id,
            status.clone(),
            state,
            continuation,
            step,
        ))
        .await;
        Ok(RunHandle {
            run_id: run_id.to_string(),
            status,
        })
    }

    async fn save(&self, checkpoint: RunCheckpoint) {
        if let Err(e) = self.saver.put(&checkpoint).await {
            // A run that cannot checkpoint still reports its status to the
            // caller; losing durability is logged, not fatal.
            tracing::error!(run_id = %checkpoint.run_id, error = %e, "checkpoint write failed");
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}
