//! LLM-backed node: one model call per visit, one channel appended.
//!
//! Assembles its prompt from a fixed system instruction plus the history of
//! its message channel, invokes the model once, tags the reply with the agent
//! name, and appends it to that same channel. It performs no other state
//! mutation — any tool calls the reply requests are executed by a
//! [`ToolsNode`](super::ToolsNode) the router sends control to.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RunError;
use crate::llm::ChatModel;
use crate::message::{Message, Role};
use crate::state::{StateRecord, StateUpdate};

use super::node::{Node, NodeOutput};
use super::run_context::RunContext;

/// Agent step over one conversation channel.
pub struct AgentNode {
    /// Agent name stamped on every reply (message attribution).
    name: String,
    /// Fixed system instruction prepended to the channel history.
    system_prompt: String,
    /// Message channel this node reads and appends to.
    channel: String,
    model: Arc<dyn ChatModel>,
}

impl AgentNode {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        channel: impl Into<String>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            channel: channel.into(),
            model,
        }
    }

    /// Channel this agent converses on; routers for this node must inspect
    /// the same channel.
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[async_trait]
impl Node for AgentNode {
    async fn run(&self, state: &StateRecord, _ctx: &RunContext) -> Result<NodeOutput, RunError> {
        let mut prompt = Vec::with_capacity(state.messages(&self.channel).len() + 1);
        prompt.push(Message::system(self.system_prompt.clone()));
        prompt.extend_from_slice(state.messages(&self.channel));

        tracing::debug!(agent = %self.name, channel = %self.channel, "invoking model");
        let mut reply = self.model.invoke(&prompt).await?;
        if reply.role != Role::Assistant {
            return Err(RunError::ExecutionFailed(format!(
                "model for agent `{}` returned a non-assistant message",
                self.name
            )));
        }
        reply.name = Some(self.name.clone());
        tracing::debug!(
            agent = %self.name,
            tool_calls = reply.tool_calls.len(),
            "model replied"
        );

        Ok(NodeOutput::Update(
            StateUpdate::new().with_messages(&self.channel, vec![reply]),
        ))
    }
}
