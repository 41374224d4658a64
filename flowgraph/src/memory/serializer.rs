//! Checkpoint serialization seam.
//!
//! Durable savers encode checkpoints through a `Serializer` so the storage
//! format is swappable independently of the backend.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::checkpointer::CheckpointError;

/// Encodes/decodes checkpoint documents for a durable backend.
pub trait Serializer: Send + Sync {
    fn to_bytes<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CheckpointError>;
    fn from_bytes<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CheckpointError>;
}

/// JSON document serializer (pretty-printed for inspectability on disk).
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn to_bytes<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CheckpointError> {
        serde_json::to_vec_pretty(value)
            .map_err(|e| CheckpointError::Serialization(e.to_string()))
    }

    fn from_bytes<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CheckpointError> {
        serde_json::from_slice(bytes).map_err(|e| CheckpointError::Serialization(e.to_string()))
    }
}
