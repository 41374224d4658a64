//! Tool-dispatch node: executes the calls requested by the last message.
//!
//! Runs every tool-call request on the triggering message of its channel, in
//! request order, synchronously and sequentially. Effects fold into one
//! merged partial update before control returns to the executor. A `Suspend`
//! effect halts the batch at that call — calls before it already ran, calls
//! after it wait for the resume — with the exact position recorded in a
//! [`ResumePoint::ToolBatch`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RunError;
use crate::message::{Message, ToolCallRequest};
use crate::state::{StateRecord, StateUpdate};
use crate::tool::{validate_arguments, Effect, Interrupt, Tool, ToolRegistry};

use super::node::{Node, NodeOutput, ResumePoint};
use super::run_context::RunContext;

/// Dispatch step over a closed tool registry and one message channel.
///
/// The channel must be the one the triggering agent node writes to; the
/// builders in [`supervisor`](crate::supervisor) wire both from a single
/// parameter.
pub struct ToolsNode {
    registry: Arc<ToolRegistry>,
    channel: String,
}

impl ToolsNode {
    pub fn new(registry: Arc<ToolRegistry>, channel: impl Into<String>) -> Self {
        Self {
            registry,
            channel: channel.into(),
        }
    }

    /// Executes one call, shielding the run from every recoverable failure:
    /// unknown names, bad argument shapes and `Error` effects all fold into a
    /// tool-role error message the agent can react to.
    async fn execute_call(&self, call: &ToolCallRequest, state: &StateRecord) -> Effect {
        let Some(tool) = self.registry.get(&call.name) else {
            tracing::warn!(tool = %call.name, "unknown tool requested");
            return Effect::Error(format!("'{}' is not a registered tool", call.name));
        };
        if let Err(reason) = validate_arguments(&tool.spec(), &call.arguments) {
            tracing::warn!(tool = %call.name, %reason, "tool arguments rejected");
            return Effect::Error(reason);
        }
        tracing::debug!(tool = %call.name, call_id = %call.id, "calling tool");
        tool.execute(call.arguments.clone(), state, &call.id).await
    }

    /// Folds one effect into the batch update, or halts with the suspend
    /// bookkeeping when the tool asked for external input.
    fn fold(
        &self,
        effect: Effect,
        call: &ToolCallRequest,
        folded: &mut StateUpdate,
    ) -> Option<Interrupt> {
        match effect {
            Effect::Update(update) => {
                folded.absorb(update);
                None
            }
            Effect::Error(text) => {
                tracing::warn!(tool = %call.name, error = %text, "tool returned error effect");
                folded.push_message(
                    &self.channel,
                    Message::tool(format!("ERROR: {}", text), &call.id).with_name(&call.name),
                );
                None
            }
            Effect::Suspend(interrupt) => Some(interrupt),
        }
    }

    /// Drives the batch from `start`, folding effects into `folded`.
    async fn dispatch(
        &self,
        state: &StateRecord,
        calls: Vec<ToolCallRequest>,
        start: usize,
        mut folded: StateUpdate,
    ) -> Result<NodeOutput, RunError> {
        for index in start..calls.len() {
            let call = &calls[index];
            let effect = self.execute_call(call, state).await;
            if let Some(interrupt) = self.fold(effect, call, &mut folded) {
                return Ok(NodeOutput::Suspend {
                    update: folded,
                    interrupt,
                    resume: ResumePoint::ToolBatch {
                        channel: self.channel.clone(),
                        calls,
                        next: index,
                    },
                });
            }
        }
        Ok(NodeOutput::Update(folded))
    }
}

#[async_trait]
impl Node for ToolsNode {
    async fn run(&self, state: &StateRecord, _ctx: &RunContext) -> Result<NodeOutput, RunError> {
        let calls = match state.last_message(&self.channel) {
            Some(msg) => msg.tool_calls.clone(),
            None => Vec::new(),
        };
        self.dispatch(state, calls, 0, StateUpdate::new()).await
    }

    /// Re-enters a suspended batch: the suspended call consumes the reply
    /// through [`Tool::resume`], then the remaining calls run. The calls
    /// before the suspension point are never executed again.
    async fn resume(
        &self,
        state: &StateRecord,
        resume: ResumePoint,
        reply: String,
        _ctx: &RunContext,
    ) -> Result<NodeOutput, RunError> {
        let ResumePoint::ToolBatch { calls, next, .. } = resume else {
            return Err(RunError::ExecutionFailed(
                "tool dispatch received a foreign resume point".into(),
            ));
        };
        let Some(call) = calls.get(next) else {
            return Err(RunError::ExecutionFailed(format!(
                "resume index {} out of range for batch of {}",
                next,
                calls.len()
            )));
        };
        let mut folded = StateUpdate::new();
        let effect = match self.registry.get(&call.name) {
            Some(tool) => {
                tool.resume(reply, call.arguments.clone(), state, &call.id)
                    .await
            }
            None => Effect::Error(format!("'{}' is not a registered tool", call.name)),
        };
        if let Some(interrupt) = self.fold(effect, call, &mut folded) {
            // A tool that suspends again from resume restarts at the same call.
            return Ok(NodeOutput::Suspend {
                update: folded,
                interrupt,
                resume: ResumePoint::ToolBatch {
                    channel: self.channel.clone(),
                    calls: calls.clone(),
                    next,
                },
            });
        }
        self.dispatch(state, calls, next + 1, folded).await
    }
}
