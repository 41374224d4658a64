//! Write a named field in the shared state.
//!
//! Destructive: any prior value at the key is replaced. The target key must
//! exist in the schema and hold text; every failure is an `Error` effect fed
//! back to the agent, never a fault.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::message::Message;
use crate::state::{ChannelKind, StateRecord, StateSchema, StateUpdate};

use super::{Effect, Tool};

/// Validated field writer.
///
/// Holds the graph's schema so the key and value can be checked before the
/// write leaves the tool. Callers are documented to read the existing value
/// first when preservation matters — the write overwrites.
pub struct SetField {
    schema: Arc<StateSchema>,
    /// Message channel the confirmation / error message is appended to.
    channel: String,
}

impl SetField {
    pub fn new(schema: Arc<StateSchema>, channel: impl Into<String>) -> Self {
        Self {
            schema,
            channel: channel.into(),
        }
    }

    fn error(&self, text: impl Into<String>) -> Effect {
        Effect::Error(text.into())
    }
}

#[async_trait]
impl Tool for SetField {
    fn name(&self) -> &str {
        "set_field"
    }

    fn description(&self) -> &str {
        "Write a value in the shared state. Destructive: if the key already \
         exists its previous content is replaced. Check the current value \
         first if you must not lose it. On schema error an ERROR message is \
         returned so you can retry."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "key": {
                    "type": "string",
                    "description": "The exact field to set (e.g. \"color\" or \"speed\")."
                },
                "value": {
                    "type": "string",
                    "description": "The value to store."
                }
            },
            "required": ["key", "value"]
        })
    }

    async fn execute(&self, arguments: Value, _state: &StateRecord, call_id: &str) -> Effect {
        let Some(key) = arguments.get("key").and_then(Value::as_str) else {
            return self.error("'key' must be a string");
        };
        let Some(value) = arguments.get("value").and_then(Value::as_str) else {
            return self.error("'value' must be a string");
        };
        match self.schema.kind(key) {
            None => self.error(format!("'{}' is not a valid field in the state", key)),
            Some(ChannelKind::Text) => {
                tracing::info!(key, value, "set_field");
                let mut update = StateUpdate::new().with_text(key, value);
                update.push_message(
                    &self.channel,
                    Message::tool(format!("{} updated.", key), call_id).with_name(self.name()),
                );
                Effect::Update(update)
            }
            Some(other) => self.error(format!(
                "'{}' holds {:?} state and cannot be set to a string",
                key, other
            )),
        }
    }
}
