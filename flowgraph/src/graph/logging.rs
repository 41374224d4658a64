//! Structured logging for graph execution events.
//!
//! Thin wrappers over `tracing` so the run loop stays readable. Levels and
//! filters are configured once at process start by the caller
//! (e.g. `tracing-subscriber` in the CLI); nothing here holds state.

use crate::error::RunError;
use crate::tool::Interrupt;

pub(super) fn log_step_start(graph: &str, node_id: &str, step: u64) {
    tracing::debug!(graph, node_id, step, "node step start");
}

pub(super) fn log_step_complete(graph: &str, node_id: &str, next: &str) {
    tracing::debug!(graph, node_id, next, "node step complete");
}

pub(super) fn log_suspend(graph: &str, node_id: &str, interrupt: &Interrupt) {
    tracing::info!(graph, node_id, prompt = %interrupt.prompt, "run suspended awaiting input");
}

pub(super) fn log_resume(graph: &str, node_id: &str) {
    tracing::info!(graph, node_id, "run resuming");
}

pub(super) fn log_failed(graph: &str, error: &RunError) {
    tracing::error!(graph, %error, "run failed");
}

pub(super) fn log_complete(graph: &str, steps: u64) {
    tracing::info!(graph, steps, "run complete");
}
