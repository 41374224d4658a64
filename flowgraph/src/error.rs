//! Run-time error taxonomy.
//!
//! Returned by the graph executor and by `Runner` operations. Recoverable
//! tool failures are **not** represented here: they are `Effect::Error`
//! values folded back into the conversation (see `tool`), and never terminate
//! a run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error that terminates a run step or rejects a caller request.
///
/// `SchemaViolation` and `BudgetExhausted` fail the run; `NoSuchGraph`,
/// `NoSuchRun` and `NotAwaitingInput` are caller usage errors; `Cancelled`
/// reports a cooperative abort between steps; `ExecutionFailed` covers node
/// and model faults.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum RunError {
    /// A state update referenced an unknown channel or the wrong value kind.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// The step-budget counter reached zero before a sink was reached.
    #[error("step budget exhausted after {steps} steps")]
    BudgetExhausted { steps: u64 },

    /// No graph registered under the given id.
    #[error("no such graph: {0}")]
    NoSuchGraph(String),

    /// No run exists with the given id.
    #[error("no such run: {0}")]
    NoSuchRun(String),

    /// `resume` was called on a run that is not suspended.
    #[error("run {0} is not awaiting input")]
    NotAwaitingInput(String),

    /// The run was aborted via its cancellation flag at a step boundary.
    #[error("run cancelled")]
    Cancelled,

    /// A node or model call failed with a message.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display of each variant names the failure and carries its payload.
    #[test]
    fn run_error_display_formats() {
        let e = RunError::SchemaViolation("unknown channel `x`".into());
        assert!(e.to_string().contains("schema violation"));
        assert!(e.to_string().contains("unknown channel `x`"));

        let e = RunError::BudgetExhausted { steps: 15 };
        assert!(e.to_string().contains("15"));

        let e = RunError::NotAwaitingInput("run-1".into());
        assert!(e.to_string().contains("run-1"));
    }

    /// **Scenario**: RunError round-trips through serde so checkpoints can carry it.
    #[test]
    fn run_error_serde_roundtrip() {
        for e in [
            RunError::SchemaViolation("c".into()),
            RunError::BudgetExhausted { steps: 3 },
            RunError::NoSuchRun("r".into()),
            RunError::Cancelled,
            RunError::ExecutionFailed("boom".into()),
        ] {
            let json = serde_json::to_string(&e).expect("serialize");
            let back: RunError = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(e, back);
        }
    }
}
