//! Message types for agent conversation channels.
//!
//! Roles: System (usually first in the list), User, Assistant, Tool.
//! Assistant messages may carry tool-call requests; Tool messages carry the
//! correlation id of the call they answer. Every constructed message gets a
//! unique id so message channels can update-in-place on re-merge (see
//! `state::StateSchema::merge`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Role of a message in a conversation channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// System prompt; typically placed first in the message list.
    System,
    /// User input.
    User,
    /// Model/agent reply; may request tool calls.
    Assistant,
    /// Result of one tool call, correlated via `tool_call_id`.
    Tool,
}

/// One tool invocation requested by an assistant message.
///
/// `id` correlates the request with the tool-role result message that answers
/// it. `arguments` is the JSON object the model produced for the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Unique call id; echoed back in the result message's `tool_call_id`.
    pub id: String,
    /// Registered tool name.
    pub name: String,
    /// Arguments as a JSON object.
    pub arguments: Value,
}

impl ToolCallRequest {
    /// Creates a request with a generated call id.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            arguments,
        }
    }

    /// Creates a request with an explicit call id (e.g. one assigned by a model API).
    pub fn with_id(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// A single message in a conversation channel.
///
/// Identity (`id`) is assigned at construction; the message-channel reducer
/// replaces an existing message with the same id instead of appending a
/// duplicate, which keeps folding a sub-graph's final state into its parent
/// idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message id used by the append reducer for dedup/update.
    pub id: String,
    pub role: Role,
    /// Textual content; may be empty for assistant messages that only request tools.
    pub content: String,
    /// Name of the agent or tool this message originates from.
    pub name: Option<String>,
    /// Tool calls requested by an assistant message; empty otherwise.
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRequest>,
    /// For tool-role messages: the id of the call this message answers.
    pub tool_call_id: Option<String>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            name: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates a tool-role result message answering the call with `call_id`.
    pub fn tool(content: impl Into<String>, call_id: impl Into<String>) -> Self {
        let mut m = Self::new(Role::Tool, content);
        m.tool_call_id = Some(call_id.into());
        m
    }

    /// Attributes the message to a named agent or tool.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches tool-call requests (assistant messages only, by convention).
    pub fn with_tool_calls(mut self, calls: Vec<ToolCallRequest>) -> Self {
        self.tool_calls = calls;
        self
    }

    /// True when the message carries at least one tool-call request.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
