//! Checkpoint record for one run.
//!
//! The whole continuation of a run as a plain serde value: status, state
//! snapshot, and (when suspended) the exact resume point. Stored by
//! `Checkpointer` implementations keyed by run id.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::graph::Continuation;
use crate::run::RunStatus;
use crate::state::StateRecord;

/// Snapshot of a run at its latest stable point.
///
/// **Interaction**: produced by [`Runner`](crate::run::Runner) after every
/// transition; consumed by `Checkpointer::put` and returned by `get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCheckpoint {
    pub run_id: String,
    /// Graph the run executes; `resume` looks the compiled plan up by this id.
    pub graph_id: String,
    pub status: RunStatus,
    /// State snapshot at the current point, whatever the status.
    pub state: StateRecord,
    /// Resume point; `Some` exactly while the run awaits input.
    pub continuation: Option<Continuation>,
    /// Transitions recorded so far (submission is 0).
    pub step: u64,
    /// Milliseconds since the Unix epoch at record time.
    pub created_at_ms: u128,
}

impl RunCheckpoint {
    /// Creates a checkpoint stamped with the current wall clock.
    pub fn new(
        run_id: impl Into<String>,
        graph_id: impl Into<String>,
        status: RunStatus,
        state: StateRecord,
        continuation: Option<Continuation>,
        step: u64,
    ) -> Self {
        let created_at_ms = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        Self {
            run_id: run_id.into(),
            graph_id: graph_id.into(),
            status,
            state,
            continuation,
            step,
            created_at_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: a checkpoint round-trips through serde with status and
    /// state intact.
    #[test]
    fn checkpoint_serde_roundtrip() {
        let cp = RunCheckpoint::new(
            "run-1",
            "workflow",
            RunStatus::AwaitingInput {
                prompt: "What colour should the car be?".into(),
            },
            StateRecord::new(),
            None,
            2,
        );
        let json = serde_json::to_string(&cp).expect("serialize");
        let back: RunCheckpoint = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.run_id, "run-1");
        assert_eq!(back.graph_id, "workflow");
        assert_eq!(back.step, 2);
        assert!(matches!(back.status, RunStatus::AwaitingInput { prompt } if prompt.contains("colour")));
    }
}
