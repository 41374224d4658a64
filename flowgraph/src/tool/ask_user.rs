//! Ask the human user a question and wait for their reply.
//!
//! The only built-in tool that suspends: `execute` raises the interrupt and
//! `resume` wraps the external reply in a tool-role result message.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::message::Message;
use crate::state::{StateRecord, StateUpdate};

use super::{Effect, Interrupt, Tool};

/// Human-input tool: suspends the run with a prompt, resumes with the answer.
pub struct AskUser {
    /// Message channel the reply message is appended to.
    channel: String,
}

impl AskUser {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }
}

#[async_trait]
impl Tool for AskUser {
    fn name(&self) -> &str {
        "ask_user"
    }

    fn description(&self) -> &str {
        "Ask the human user a specific question and return their response. \
         Sends the prompt to the user and pauses execution until they reply."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "A clear, concise question for the user."
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, arguments: Value, _state: &StateRecord, _call_id: &str) -> Effect {
        let prompt = arguments
            .get("prompt")
            .and_then(Value::as_str)
            .unwrap_or_default();
        tracing::info!(prompt, "ask_user suspending");
        Effect::Suspend(Interrupt::new(prompt))
    }

    async fn resume(
        &self,
        reply: String,
        _arguments: Value,
        _state: &StateRecord,
        call_id: &str,
    ) -> Effect {
        tracing::info!(reply = %reply, "ask_user resumed");
        let mut update = StateUpdate::new();
        update.push_message(
            &self.channel,
            Message::tool(reply, call_id).with_name(self.name()),
        );
        Effect::Update(update)
    }
}
