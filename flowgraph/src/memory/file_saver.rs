//! Durable checkpointer on JSON files, one document per run.
//!
//! Good enough for single-node deployments where a suspended run must be
//! resumable after a restart or from another process: the document holds the
//! whole continuation, so any `Runner` with the same graphs registered can
//! pick the run up.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::checkpoint::RunCheckpoint;
use super::checkpointer::{CheckpointError, Checkpointer};
use super::serializer::{JsonSerializer, Serializer};

/// File-backed checkpoint store: `<dir>/<run_id>.json`.
pub struct FileSaver {
    dir: PathBuf,
    serializer: JsonSerializer,
}

impl FileSaver {
    /// Creates the saver, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| CheckpointError::Storage(e.to_string()))?;
        Ok(Self {
            dir,
            serializer: JsonSerializer,
        })
    }

    fn path_for(&self, run_id: &str) -> PathBuf {
        // Run ids are UUIDs; keep the guard anyway so a hostile id cannot
        // escape the directory.
        let safe: String = run_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

fn storage_err(e: std::io::Error) -> CheckpointError {
    CheckpointError::Storage(e.to_string())
}

#[async_trait]
impl Checkpointer for FileSaver {
    async fn put(&self, checkpoint: &RunCheckpoint) -> Result<(), CheckpointError> {
        let bytes = self.serializer.to_bytes(checkpoint)?;
        tokio::fs::write(self.path_for(&checkpoint.run_id), bytes)
            .await
            .map_err(storage_err)
    }

    async fn get(&self, run_id: &str) -> Result<Option<RunCheckpoint>, CheckpointError> {
        let path = self.path_for(run_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(self.serializer.from_bytes(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    async fn list(&self) -> Result<Vec<String>, CheckpointError> {
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(storage_err)?;
        while let Some(entry) = entries.next_entry().await.map_err(storage_err)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        Ok(ids)
    }

    async fn delete(&self, run_id: &str) -> Result<(), CheckpointError> {
        match tokio::fs::remove_file(self.path_for(run_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_err(e)),
        }
    }
}

impl FileSaver {
    /// Directory the documents live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::RunStatus;
    use crate::state::StateRecord;

    /// **Scenario**: a checkpoint written by one saver instance is readable
    /// by a fresh instance over the same directory (cross-process shape).
    #[tokio::test]
    async fn file_saver_roundtrip_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let saver = FileSaver::new(dir.path()).unwrap();
        let cp = RunCheckpoint::new(
            "run-abc",
            "workflow",
            RunStatus::Completed,
            StateRecord::new(),
            None,
            3,
        );
        saver.put(&cp).await.unwrap();

        let other = FileSaver::new(dir.path()).unwrap();
        let loaded = other.get("run-abc").await.unwrap().unwrap();
        assert_eq!(loaded.graph_id, "workflow");
        assert_eq!(loaded.step, 3);
        assert_eq!(other.list().await.unwrap(), vec!["run-abc"]);

        other.delete("run-abc").await.unwrap();
        assert!(other.get("run-abc").await.unwrap().is_none());
        // Deleting again is a no-op.
        other.delete("run-abc").await.unwrap();
    }

    /// **Scenario**: unknown run ids read as None, not as an error.
    #[tokio::test]
    async fn file_saver_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let saver = FileSaver::new(dir.path()).unwrap();
        assert!(saver.get("nope").await.unwrap().is_none());
    }
}
