//! Read a named field from the state (short-term memory).
//!
//! Read-only: never produces a channel write, only the tool-role result
//! message carrying the stored value (or the zero value when the field is
//! absent).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::message::Message;
use crate::state::{StateRecord, StateUpdate};

use super::{Effect, Tool};

/// Pure field reader: exposes `state[key]` to the model.
pub struct GetField {
    /// Message channel the result message is appended to.
    channel: String,
}

impl GetField {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }
}

#[async_trait]
impl Tool for GetField {
    fn name(&self) -> &str {
        "get_field"
    }

    fn description(&self) -> &str {
        "Read any value from the shared state. Returns the stored value, or an \
         empty string when the key is absent. Read-only: never modifies state."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "key": {
                    "type": "string",
                    "description": "The exact field to inspect (e.g. \"color\")."
                }
            },
            "required": ["key"]
        })
    }

    async fn execute(&self, arguments: Value, state: &StateRecord, call_id: &str) -> Effect {
        let key = arguments
            .get("key")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let value = state.text(key).to_string();
        tracing::debug!(key, value = %value, "get_field");
        let mut update = StateUpdate::new();
        update.push_message(
            &self.channel,
            Message::tool(value, call_id).with_name(self.name()),
        );
        Effect::Update(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::state::StateSchema;

    /// **Scenario**: reading a set field returns its value as a tool message
    /// and writes no other channel.
    #[tokio::test]
    async fn get_field_returns_value_as_tool_message() {
        let schema = StateSchema::builder()
            .messages("messagesColor")
            .text("color")
            .build();
        let state = schema
            .merge(
                &StateRecord::new(),
                &[StateUpdate::new().with_text("color", "red")],
            )
            .unwrap();
        let tool = GetField::new("messagesColor");
        let effect = tool
            .execute(json!({"key": "color"}), &state, "call-1")
            .await;
        match effect {
            Effect::Update(update) => {
                let channels: Vec<_> = update.iter().map(|(n, _)| n.clone()).collect();
                assert_eq!(channels, vec!["messagesColor".to_string()]);
                let merged = schema.merge(&state, &[update]).unwrap();
                let msg = merged.last_message("messagesColor").unwrap();
                assert_eq!(msg.role, Role::Tool);
                assert_eq!(msg.content, "red");
                assert_eq!(msg.tool_call_id.as_deref(), Some("call-1"));
            }
            other => panic!("expected Update, got {:?}", other),
        }
    }

    /// **Scenario**: reading an absent field returns the zero value, not an error.
    #[tokio::test]
    async fn get_field_absent_reads_zero_value() {
        let tool = GetField::new("messagesColor");
        let effect = tool
            .execute(json!({"key": "color"}), &StateRecord::new(), "call-2")
            .await;
        match effect {
            Effect::Update(update) => {
                let (_, value) = update.iter().next().unwrap();
                match value {
                    crate::state::ChannelValue::Messages(list) => {
                        assert_eq!(list[0].content, "");
                    }
                    other => panic!("expected messages, got {:?}", other),
                }
            }
            other => panic!("expected Update, got {:?}", other),
        }
    }
}
