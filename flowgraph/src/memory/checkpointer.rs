//! Checkpointer trait: where run checkpoints live.

use async_trait::async_trait;
use thiserror::Error;

use super::checkpoint::RunCheckpoint;

/// Error from a checkpoint backend.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Backend storage failed (I/O, lock poisoning, …).
    #[error("checkpoint storage failed: {0}")]
    Storage(String),

    /// Checkpoint could not be encoded or decoded.
    #[error("checkpoint serialization failed: {0}")]
    Serialization(String),
}

/// Storage for run checkpoints, keyed by run id.
///
/// One checkpoint per run: `put` overwrites the previous record so `get`
/// always returns the latest stable point. Implementations: [`MemorySaver`]
/// (in-memory), [`FileSaver`] (JSON files).
///
/// [`MemorySaver`]: super::MemorySaver
/// [`FileSaver`]: super::FileSaver
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Stores (or replaces) the checkpoint for its run id.
    async fn put(&self, checkpoint: &RunCheckpoint) -> Result<(), CheckpointError>;

    /// Latest checkpoint for a run, `None` when the run is unknown.
    async fn get(&self, run_id: &str) -> Result<Option<RunCheckpoint>, CheckpointError>;

    /// Ids of all stored runs.
    async fn list(&self) -> Result<Vec<String>, CheckpointError>;

    /// Removes a run's checkpoint; unknown ids are a no-op.
    async fn delete(&self, run_id: &str) -> Result<(), CheckpointError>;
}
