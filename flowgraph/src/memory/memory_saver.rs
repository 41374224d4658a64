//! In-memory checkpointer for development and tests.

use async_trait::async_trait;
use dashmap::DashMap;

use super::checkpoint::RunCheckpoint;
use super::checkpointer::{CheckpointError, Checkpointer};

/// Process-local checkpoint store on a concurrent map.
///
/// Checkpoints do not survive the process; use [`FileSaver`](super::FileSaver)
/// when a resume may come from elsewhere.
#[derive(Debug, Default)]
pub struct MemorySaver {
    checkpoints: DashMap<String, RunCheckpoint>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for MemorySaver {
    async fn put(&self, checkpoint: &RunCheckpoint) -> Result<(), CheckpointError> {
        self.checkpoints
            .insert(checkpoint.run_id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn get(&self, run_id: &str) -> Result<Option<RunCheckpoint>, CheckpointError> {
        Ok(self.checkpoints.get(run_id).map(|c| c.clone()))
    }

    async fn list(&self) -> Result<Vec<String>, CheckpointError> {
        Ok(self.checkpoints.iter().map(|e| e.key().clone()).collect())
    }

    async fn delete(&self, run_id: &str) -> Result<(), CheckpointError> {
        self.checkpoints.remove(run_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::RunStatus;
    use crate::state::StateRecord;

    fn checkpoint(run_id: &str, step: u64) -> RunCheckpoint {
        RunCheckpoint::new(run_id, "g", RunStatus::Running, StateRecord::new(), None, step)
    }

    /// **Scenario**: put/get/list/delete cycle over two runs.
    #[tokio::test]
    async fn memory_saver_crud() {
        let saver = MemorySaver::new();
        saver.put(&checkpoint("r1", 0)).await.unwrap();
        saver.put(&checkpoint("r2", 0)).await.unwrap();

        assert!(saver.get("r1").await.unwrap().is_some());
        assert!(saver.get("r3").await.unwrap().is_none());

        let mut ids = saver.list().await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["r1", "r2"]);

        saver.delete("r1").await.unwrap();
        assert!(saver.get("r1").await.unwrap().is_none());
    }

    /// **Scenario**: a second put for the same run replaces the first.
    #[tokio::test]
    async fn memory_saver_put_replaces() {
        let saver = MemorySaver::new();
        saver.put(&checkpoint("r1", 0)).await.unwrap();
        saver.put(&checkpoint("r1", 5)).await.unwrap();
        assert_eq!(saver.get("r1").await.unwrap().unwrap().step, 5);
    }
}
