//! State schema: the closed channel set and its merge policies.
//!
//! Fixed at graph-compile time; unknown channel names in an update are a
//! validation error, never silently dropped.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::RunError;

use super::record::{ChannelValue, StateRecord, StateUpdate};

/// Merge policy of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Append-only message list; incoming messages with a known id update in place.
    Messages,
    /// Free-form string, last write wins. Absent reads as the empty string.
    Text,
    /// Integer counter, last write wins. Absent reads as zero. The root
    /// executor decrements every counter channel once per super-step.
    Counter,
}

/// Closed map from channel name to merge policy.
///
/// Built once with [`StateSchema::builder`] and shared (via `Arc`) by the
/// graph that declares it. Owns validation, merging and projection; the
/// record itself is a plain value map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSchema {
    channels: HashMap<String, ChannelKind>,
}

/// Builder for [`StateSchema`]; one call per channel.
#[derive(Debug, Default)]
pub struct StateSchemaBuilder {
    channels: HashMap<String, ChannelKind>,
}

impl StateSchemaBuilder {
    /// Declares an append-only message channel.
    pub fn messages(mut self, name: impl Into<String>) -> Self {
        self.channels.insert(name.into(), ChannelKind::Messages);
        self
    }

    /// Declares a last-write-wins text channel.
    pub fn text(mut self, name: impl Into<String>) -> Self {
        self.channels.insert(name.into(), ChannelKind::Text);
        self
    }

    /// Declares a step-budget counter channel.
    pub fn counter(mut self, name: impl Into<String>) -> Self {
        self.channels.insert(name.into(), ChannelKind::Counter);
        self
    }

    pub fn build(self) -> StateSchema {
        StateSchema {
            channels: self.channels,
        }
    }
}

impl StateSchema {
    pub fn builder() -> StateSchemaBuilder {
        StateSchemaBuilder::default()
    }

    /// Kind of a declared channel, or `None` for unknown names.
    pub fn kind(&self, name: &str) -> Option<ChannelKind> {
        self.channels.get(name).copied()
    }

    /// True when the schema declares the channel.
    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Iterator over declared channel names.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Names of all counter channels (the executor's step budgets).
    pub fn counters(&self) -> impl Iterator<Item = &str> {
        self.channels
            .iter()
            .filter(|(_, k)| **k == ChannelKind::Counter)
            .map(|(n, _)| n.as_str())
    }

    /// Checks one update against the schema: every key must be declared and
    /// its value must match the declared kind.
    pub fn validate(&self, update: &StateUpdate) -> Result<(), RunError> {
        for (name, value) in update.iter() {
            match self.channels.get(name) {
                None => {
                    return Err(RunError::SchemaViolation(format!(
                        "unknown channel `{}`",
                        name
                    )))
                }
                Some(kind) => {
                    let matches = matches!(
                        (kind, value),
                        (ChannelKind::Messages, ChannelValue::Messages(_))
                            | (ChannelKind::Text, ChannelValue::Text(_))
                            | (ChannelKind::Counter, ChannelValue::Counter(_))
                    );
                    if !matches {
                        return Err(RunError::SchemaViolation(format!(
                            "channel `{}` expects {:?}, got {}",
                            name,
                            kind,
                            value.kind_name()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Applies partial updates to the record, in order, using each channel's
    /// declared reducer.
    ///
    /// The whole batch is validated before any channel is touched, so a
    /// rejected update leaves `current` unchanged. Message channels append
    /// (updating in place on id match); text and counter channels keep the
    /// last written value.
    pub fn merge(
        &self,
        current: &StateRecord,
        updates: &[StateUpdate],
    ) -> Result<StateRecord, RunError> {
        for update in updates {
            self.validate(update)?;
        }
        let mut next = current.clone();
        for update in updates {
            for (name, value) in update.iter() {
                match value {
                    ChannelValue::Messages(incoming) => {
                        next.upsert_messages(name, incoming.clone());
                    }
                    other => {
                        next.set_raw(name, other.clone());
                    }
                }
            }
        }
        Ok(next)
    }

    /// Applies the system decrement to every populated counter channel.
    ///
    /// Part of the counter contract: the root executor calls this once per
    /// super-step regardless of what the step's node wrote. Counters that
    /// were never initialised are left absent (no bound yet).
    pub fn decrement_counters(&self, record: &StateRecord) -> StateRecord {
        let mut next = record.clone();
        for name in self.counters() {
            if record.get(name).is_some() {
                next.set_raw(name, ChannelValue::Counter(record.counter(name) - 1));
            }
        }
        next
    }

    /// Restricts a record to the channels this schema declares.
    ///
    /// Used to build the state view handed to a sub-graph: channels the inner
    /// graph does not declare are invisible to it. Absent channels stay
    /// absent (reads fall back to zero values).
    pub fn project(&self, record: &StateRecord) -> StateRecord {
        let mut view = StateRecord::new();
        for name in self.channels.keys() {
            if let Some(value) = record.get(name) {
                view.set_raw(name, value.clone());
            }
        }
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    fn demo_schema() -> StateSchema {
        StateSchema::builder()
            .messages("messages")
            .text("color")
            .counter("remaining_steps")
            .build()
    }

    /// **Scenario**: builder declares channels with the expected kinds.
    #[test]
    fn builder_declares_kinds() {
        let s = demo_schema();
        assert_eq!(s.kind("messages"), Some(ChannelKind::Messages));
        assert_eq!(s.kind("color"), Some(ChannelKind::Text));
        assert_eq!(s.kind("remaining_steps"), Some(ChannelKind::Counter));
        assert_eq!(s.kind("missing"), None);
        assert_eq!(s.counters().collect::<Vec<_>>(), vec!["remaining_steps"]);
    }

    /// **Scenario**: update with an unknown channel name fails validation.
    #[test]
    fn validate_rejects_unknown_channel() {
        let s = demo_schema();
        let update = StateUpdate::new().with_text("unknownField", "x");
        let err = s.validate(&update).unwrap_err();
        assert!(matches!(err, RunError::SchemaViolation(msg) if msg.contains("unknownField")));
    }

    /// **Scenario**: update with the wrong value kind for a channel fails validation.
    #[test]
    fn validate_rejects_kind_mismatch() {
        let s = demo_schema();
        let update = StateUpdate::new().with_counter("color", 3);
        assert!(matches!(
            s.validate(&update),
            Err(RunError::SchemaViolation(_))
        ));
    }

    /// **Scenario**: a rejected merge leaves the prior record unchanged.
    #[test]
    fn merge_rejected_batch_leaves_record_intact() {
        let s = demo_schema();
        let base = s
            .merge(
                &StateRecord::new(),
                &[StateUpdate::new().with_text("color", "red")],
            )
            .unwrap();
        let bad = StateUpdate::new()
            .with_text("color", "blue")
            .with_text("unknownField", "x");
        assert!(s.merge(&base, &[bad]).is_err());
        assert_eq!(base.text("color"), "red");
    }

    /// **Scenario**: text channels keep the last write across a batch.
    #[test]
    fn merge_text_last_write_wins() {
        let s = demo_schema();
        let merged = s
            .merge(
                &StateRecord::new(),
                &[
                    StateUpdate::new().with_text("color", "red"),
                    StateUpdate::new().with_text("color", "blue"),
                ],
            )
            .unwrap();
        assert_eq!(merged.text("color"), "blue");
    }

    /// **Scenario**: message channels append across updates, preserving order.
    #[test]
    fn merge_messages_append_in_order() {
        let s = demo_schema();
        let m1 = Message::user("one");
        let m2 = Message::assistant("two");
        let merged = s
            .merge(
                &StateRecord::new(),
                &[
                    StateUpdate::new().with_messages("messages", vec![m1.clone()]),
                    StateUpdate::new().with_messages("messages", vec![m2.clone()]),
                ],
            )
            .unwrap();
        let msgs = merged.messages("messages");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].id, m1.id);
        assert_eq!(msgs[1].id, m2.id);
    }

    /// **Scenario**: an incoming message with a known id replaces the stored
    /// one instead of duplicating it.
    #[test]
    fn merge_messages_upsert_by_id() {
        let s = demo_schema();
        let original = Message::assistant("draft");
        let base = s
            .merge(
                &StateRecord::new(),
                &[StateUpdate::new().with_messages("messages", vec![original.clone()])],
            )
            .unwrap();
        let mut revised = original.clone();
        revised.content = "final".into();
        let merged = s
            .merge(
                &base,
                &[StateUpdate::new().with_messages("messages", vec![revised])],
            )
            .unwrap();
        let msgs = merged.messages("messages");
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].content, "final");
    }

    /// **Scenario**: decrement touches populated counters and skips absent ones.
    #[test]
    fn decrement_counters_skips_absent() {
        let s = demo_schema();
        let empty = s.decrement_counters(&StateRecord::new());
        assert!(empty.get("remaining_steps").is_none());

        let record = s
            .merge(
                &StateRecord::new(),
                &[StateUpdate::new().with_counter("remaining_steps", 5)],
            )
            .unwrap();
        let decremented = s.decrement_counters(&record);
        assert_eq!(decremented.counter("remaining_steps"), 4);
    }

    /// **Scenario**: projection keeps declared channels only.
    #[test]
    fn project_restricts_to_declared_channels() {
        let outer = StateSchema::builder()
            .messages("messages")
            .messages("messagesColor")
            .text("color")
            .build();
        let inner = StateSchema::builder()
            .messages("messagesColor")
            .text("color")
            .build();
        let record = outer
            .merge(
                &StateRecord::new(),
                &[StateUpdate::new()
                    .with_messages("messages", vec![Message::user("hi")])
                    .with_text("color", "red")],
            )
            .unwrap();
        let view = inner.project(&record);
        assert!(view.get("messages").is_none());
        assert_eq!(view.text("color"), "red");
    }
}
