//! Channelled state: schema, record, and partial updates.
//!
//! A graph's shared state is a closed set of named channels, each with its
//! own merge policy (`ChannelKind`):
//!
//! - `Messages`: ordered conversation history; updates append, except that an
//!   incoming message whose id already exists replaces the stored one.
//! - `Text`: free-form scalar; last write wins, absent reads as `""`.
//! - `Counter`: integer step budget; last write wins, absent reads as `0`,
//!   and the root executor decrements it once per super-step.
//!
//! Nodes never hold a writable reference to the live record: they return
//! `StateUpdate` values and the executor applies them through
//! `StateSchema::merge`, which validates the whole update against the schema
//! before touching any channel.

mod record;
mod schema;

pub use record::{ChannelValue, StateRecord, StateUpdate};
pub use schema::{ChannelKind, StateSchema, StateSchemaBuilder};
