//! Chat model abstraction for LLM-backed nodes.
//!
//! An agent node depends on an opaque callable: messages in, one assistant
//! message (with optional tool-call requests) out. This module defines the
//! trait, the mock/scripted implementations used in tests, and the optional
//! OpenAI-backed client (feature `openai`).

mod mock;

#[cfg(feature = "openai")]
mod openai;

pub use mock::{MockChatModel, ScriptedChatModel};

#[cfg(feature = "openai")]
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::RunError;
use crate::message::Message;

/// Chat model: given the conversation so far, return the next assistant message.
///
/// One synchronous call per agent step; the returned message may carry
/// tool-call requests that a downstream dispatch node executes. The core
/// makes no assumption about the implementation beyond calling it one at a
/// time per run.
///
/// **Interaction**: consumed by [`AgentNode`](crate::graph::AgentNode);
/// implementations bind their own tool declarations (see
/// [`ToolSpec`](crate::tool::ToolSpec)).
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Invoke one turn: read messages, return the assistant reply.
    async fn invoke(&self, messages: &[Message]) -> Result<Message, RunError>;
}
