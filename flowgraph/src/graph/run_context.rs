//! Run context passed explicitly into the executor and every node.
//!
//! Carries the run identity and the cooperative cancellation flag, and marks
//! whether this executor loop is the root of the run (sub-graph invocations
//! get a child context). No global state: whoever drives the run constructs
//! the context once and hands it down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Context for one executor loop.
#[derive(Clone)]
pub struct RunContext {
    /// Id of the enclosing run, when driven through a `Runner`.
    pub run_id: Option<String>,
    cancel: Option<Arc<AtomicBool>>,
    root: bool,
}

impl Default for RunContext {
    fn default() -> Self {
        Self {
            run_id: None,
            cancel: None,
            root: true,
        }
    }
}

impl RunContext {
    /// Root context for a run with the given id.
    pub fn for_run(run_id: impl Into<String>) -> Self {
        Self {
            run_id: Some(run_id.into()),
            ..Self::default()
        }
    }

    /// Attaches a cancellation flag checked at each step boundary.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Child context for a sub-graph invocation: same run identity and
    /// cancellation flag, but not the root loop (no budget accounting).
    pub fn child(&self) -> Self {
        Self {
            run_id: self.run_id.clone(),
            cancel: self.cancel.clone(),
            root: false,
        }
    }

    /// True for the run's own executor loop; only the root decrements step
    /// budgets and enforces exhaustion.
    pub fn is_root(&self) -> bool {
        self.root
    }

    /// True once an external abort was requested. Checked between steps only;
    /// an in-flight node is never forcibly interrupted.
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|f| f.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}
