//! Mock chat models for tests and examples.
//!
//! `MockChatModel` returns one fixed reply; `ScriptedChatModel` pops a
//! pre-programmed sequence, which is enough to drive a whole supervisor
//! workflow deterministically in tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::RunError;
use crate::message::Message;

use super::ChatModel;

/// Chat model that returns a clone of one fixed assistant message.
pub struct MockChatModel {
    reply: Message,
}

impl MockChatModel {
    /// Creates a mock that always answers with `reply`.
    pub fn with_reply(reply: Message) -> Self {
        Self { reply }
    }

    /// Creates a mock that always answers with plain assistant text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            reply: Message::assistant(text),
        }
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn invoke(&self, _messages: &[Message]) -> Result<Message, RunError> {
        Ok(self.reply.clone())
    }
}

/// Chat model that replays a fixed sequence of replies, one per invoke.
///
/// Fails with `ExecutionFailed` when the script runs dry, which makes an
/// agent loop that takes more turns than a test expects fail loudly instead
/// of spinning.
pub struct ScriptedChatModel {
    script: Mutex<VecDeque<Message>>,
}

impl ScriptedChatModel {
    pub fn new(replies: Vec<Message>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
        }
    }

    /// Number of replies left in the script.
    pub fn remaining(&self) -> usize {
        self.script.lock().expect("script lock").len()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn invoke(&self, _messages: &[Message]) -> Result<Message, RunError> {
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .ok_or_else(|| RunError::ExecutionFailed("scripted model exhausted".into()))
    }
}
