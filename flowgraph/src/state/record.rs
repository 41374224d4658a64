//! State record and partial updates: channel-name → value maps.
//!
//! `StateRecord` is the merged state the executor owns; `StateUpdate` is the
//! partial update a node or tool returns. Both are plain serde values so a
//! suspended run can be checkpointed and resumed elsewhere.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Value held by one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelValue {
    Messages(Vec<Message>),
    Text(String),
    Counter(i64),
}

impl ChannelValue {
    /// Human-readable kind name for schema-violation messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ChannelValue::Messages(_) => "messages",
            ChannelValue::Text(_) => "text",
            ChannelValue::Counter(_) => "counter",
        }
    }
}

/// Merged state of a run: one value per populated channel.
///
/// Reads of absent scalar channels return the declared zero value (empty
/// string / zero), never an error, so router predicates can probe fields that
/// have not been set yet. Only the executor writes to a record, through
/// [`StateSchema::merge`](super::StateSchema::merge).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    values: HashMap<String, ChannelValue>,
}

impl StateRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw channel value, `None` when the channel has never been written.
    pub fn get(&self, name: &str) -> Option<&ChannelValue> {
        self.values.get(name)
    }

    /// Text channel value; absent reads as `""`.
    pub fn text(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(ChannelValue::Text(s)) => s.as_str(),
            _ => "",
        }
    }

    /// Counter channel value; absent reads as `0`.
    pub fn counter(&self, name: &str) -> i64 {
        match self.values.get(name) {
            Some(ChannelValue::Counter(n)) => *n,
            _ => 0,
        }
    }

    /// Message channel history; absent reads as the empty slice.
    pub fn messages(&self, name: &str) -> &[Message] {
        match self.values.get(name) {
            Some(ChannelValue::Messages(m)) => m.as_slice(),
            _ => &[],
        }
    }

    /// Most recent message of a channel, if any.
    pub fn last_message(&self, name: &str) -> Option<&Message> {
        self.messages(name).last()
    }

    /// Iterator over populated channels.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ChannelValue)> {
        self.values.iter()
    }

    /// Turns the whole record into a partial update (used when folding a
    /// sub-graph's final state back into its parent).
    pub fn into_update(self) -> StateUpdate {
        StateUpdate {
            values: self.values,
        }
    }

    pub(super) fn set_raw(&mut self, name: &str, value: ChannelValue) {
        self.values.insert(name.to_string(), value);
    }

    /// Message-channel reducer: append incoming messages, replacing in place
    /// any whose id is already present.
    pub(super) fn upsert_messages(&mut self, name: &str, incoming: Vec<Message>) {
        let slot = self
            .values
            .entry(name.to_string())
            .or_insert_with(|| ChannelValue::Messages(Vec::new()));
        match slot {
            ChannelValue::Messages(existing) => {
                for msg in incoming {
                    if let Some(stored) = existing.iter_mut().find(|m| m.id == msg.id) {
                        *stored = msg;
                    } else {
                        existing.push(msg);
                    }
                }
            }
            // merge() validated the kind already; keep the reducer total anyway.
            other => *other = ChannelValue::Messages(incoming),
        }
    }
}

/// Partial update produced by one node or tool: channels to merge.
///
/// Built with the `with_*` methods; validated against the graph's schema by
/// the executor before it is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    values: HashMap<String, ChannelValue>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the update touches no channel.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .insert(name.into(), ChannelValue::Text(value.into()));
        self
    }

    pub fn with_counter(mut self, name: impl Into<String>, value: i64) -> Self {
        self.values
            .insert(name.into(), ChannelValue::Counter(value));
        self
    }

    pub fn with_messages(mut self, name: impl Into<String>, messages: Vec<Message>) -> Self {
        self.values
            .insert(name.into(), ChannelValue::Messages(messages));
        self
    }

    /// Appends one message to the update's list for `name` (creating it if needed).
    pub fn push_message(&mut self, name: &str, message: Message) {
        match self
            .values
            .entry(name.to_string())
            .or_insert_with(|| ChannelValue::Messages(Vec::new()))
        {
            ChannelValue::Messages(list) => list.push(message),
            other => *other = ChannelValue::Messages(vec![message]),
        }
    }

    /// Folds another update into this one: message lists concatenate, scalar
    /// channels take the later value. Used by tool dispatch to combine the
    /// effects of one batch before the executor merges the result.
    pub fn absorb(&mut self, other: StateUpdate) {
        for (name, value) in other.values {
            match (self.values.get_mut(&name), value) {
                (Some(ChannelValue::Messages(mine)), ChannelValue::Messages(theirs)) => {
                    mine.extend(theirs);
                }
                (_, value) => {
                    self.values.insert(name, value);
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ChannelValue)> {
        self.values.iter()
    }
}
