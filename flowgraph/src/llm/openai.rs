//! OpenAI Chat Completions client implementing `ChatModel` (ChatOpenAI).
//!
//! Uses the real OpenAI Chat Completions API. Requires `OPENAI_API_KEY` (or
//! explicit config). Bind tools with `with_tools` to enable `tool_calls` in
//! the response.
//!
//! Request mapping: system/user/assistant messages map to their chat roles.
//! Tool-role results and prior tool-call requests are flattened into text
//! blocks when replayed — the conversation the model sees stays complete
//! without depending on provider-side call-id bookkeeping.
//!
//! **Interaction**: implements `ChatModel`; used by `AgentNode` like the mock
//! models. Depends on `async_openai` (feature `openai`).

use async_trait::async_trait;

use crate::error::RunError;
use crate::llm::ChatModel;
use crate::message::{Message, Role, ToolCallRequest};
use crate::tool::ToolSpec;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionMessageToolCalls, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage, ChatCompletionTool,
        ChatCompletionTools, CreateChatCompletionRequestArgs, FunctionObject,
    },
    Client,
};

/// OpenAI Chat Completions client.
///
/// Uses `OPENAI_API_KEY` from the environment by default; or provide config
/// via `ChatOpenAI::with_config`. Set tools (e.g. from
/// `ToolRegistry::specs()` or `handoff_tool_specs`) to enable tool calls.
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    tools: Option<Vec<ToolSpec>>,
    temperature: Option<f32>,
}

impl ChatOpenAI {
    /// Build client with default config (API key from `OPENAI_API_KEY` env).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            tools: None,
            temperature: None,
        }
    }

    /// Build client with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            tools: None,
            temperature: None,
        }
    }

    /// Set tools for this completion (enables tool_calls in the response).
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set temperature (0–2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Convert a channel history to OpenAI request messages.
    fn messages_to_request(messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m.role {
                Role::System => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage::from(m.content.as_str()),
                ),
                Role::User => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(m.content.as_str()),
                ),
                Role::Assistant => {
                    let text = if m.tool_calls.is_empty() {
                        m.content.clone()
                    } else {
                        let calls: Vec<String> = m
                            .tool_calls
                            .iter()
                            .map(|c| format!("{}({})", c.name, c.arguments))
                            .collect();
                        format!("{}\n[requested tools: {}]", m.content, calls.join(", "))
                    };
                    ChatCompletionRequestMessage::Assistant(text.as_str().into())
                }
                Role::Tool => {
                    let origin = m.name.as_deref().unwrap_or("tool");
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(
                        format!("[{} result] {}", origin, m.content).as_str(),
                    ))
                }
            })
            .collect()
    }
}

#[async_trait]
impl ChatModel for ChatOpenAI {
    async fn invoke(&self, messages: &[Message]) -> Result<Message, RunError> {
        let openai_messages = Self::messages_to_request(messages);
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(openai_messages);

        if let Some(ref tools) = self.tools {
            let chat_tools: Vec<ChatCompletionTools> = tools
                .iter()
                .map(|t| {
                    ChatCompletionTools::Function(ChatCompletionTool {
                        function: FunctionObject {
                            name: t.name.clone(),
                            description: Some(t.description.clone()),
                            parameters: Some(t.parameters.clone()),
                            ..Default::default()
                        },
                    })
                })
                .collect();
            args.tools(chat_tools);
        }

        if let Some(t) = self.temperature {
            args.temperature(t);
        }

        let request = args
            .build()
            .map_err(|e| RunError::ExecutionFailed(format!("OpenAI request build failed: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| RunError::ExecutionFailed(format!("OpenAI API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RunError::ExecutionFailed("OpenAI returned no choices".to_string()))?;

        let msg = choice.message;
        let content = msg.content.unwrap_or_default();
        let tool_calls: Vec<ToolCallRequest> = msg
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|tc| {
                if let ChatCompletionMessageToolCalls::Function(f) = tc {
                    let arguments = serde_json::from_str(&f.function.arguments)
                        .unwrap_or(serde_json::json!({}));
                    Some(ToolCallRequest::with_id(f.id, f.function.name, arguments))
                } else {
                    None
                }
            })
            .collect();

        Ok(Message::assistant(content).with_tool_calls(tool_calls))
    }
}
