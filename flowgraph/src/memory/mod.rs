//! Run persistence: checkpoints, savers, serialization.
//!
//! Every run transition is recorded as a [`RunCheckpoint`] through a
//! [`Checkpointer`]. A suspended run's checkpoint carries its full state and
//! [`Continuation`](crate::graph::Continuation), which is everything a
//! resume needs — including a resume issued much later, by a different
//! process, when a durable saver such as [`FileSaver`] is used.
//!
//! | Saver | Persistence | Use case |
//! |---|---|---|
//! | [`MemorySaver`] | in-memory | dev, tests |
//! | [`FileSaver`] | JSON files | single-node durable resume |

mod checkpoint;
mod checkpointer;
mod file_saver;
mod memory_saver;
mod serializer;

pub use checkpoint::RunCheckpoint;
pub use checkpointer::{CheckpointError, Checkpointer};
pub use file_saver::FileSaver;
pub use memory_saver::MemorySaver;
pub use serializer::{JsonSerializer, Serializer};
