//! Tool invocation contract: named handlers returning explicit effects.
//!
//! A tool is a named, schema-described function over a read view of the
//! state. It never mutates state directly; it returns an [`Effect`]:
//!
//! - `Update`: channels to merge, including the tool-role result message the
//!   tool generates for traceability.
//! - `Suspend`: halt the enclosing run for external input; on resume the tool
//!   receives the reply through [`Tool::resume`].
//! - `Error`: a recoverable failure, folded back into the conversation as a
//!   tool-role message so the agent can retry — it never aborts the run.
//!
//! Tools live in a closed [`ToolRegistry`]; argument shapes are validated
//! against each tool's declared schema before invocation rather than inside
//! the handlers.

mod ask_user;
mod get_field;
mod set_field;

pub use ask_user::AskUser;
pub use get_field::GetField;
pub use set_field::SetField;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::{StateRecord, StateUpdate};

/// Suspension raised by a tool: the run pauses until an external reply.
///
/// An explicit data value, not a control transfer: the executor checks the
/// returned effect kind and persists the continuation alongside the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interrupt {
    /// Prompt text to surface to whoever answers the run.
    pub prompt: String,
}

impl Interrupt {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// Outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Channels to merge, plus the tool's own result message.
    Update(StateUpdate),
    /// Halt the run awaiting external input.
    Suspend(Interrupt),
    /// Recoverable failure, surfaced to the agent as a tool message.
    Error(String),
}

/// Declaration of a tool for model binding: name, description, argument schema.
///
/// `parameters` is a JSON-schema object (`{"type": "object", "properties":
/// …, "required": […]}`); the registry validates call arguments against it
/// before dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A named handler implementing the tool calling convention.
///
/// `execute` gets the parsed arguments, a read view of the merged state, and
/// the unique call id to stamp on its result message. Only tools that suspend
/// override `resume`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Registered name, as exposed to the model.
    fn name(&self) -> &str;

    /// Human/model-facing description.
    fn description(&self) -> &str {
        ""
    }

    /// JSON schema of the accepted arguments.
    fn parameters(&self) -> Value;

    /// One invocation; must not block on external input (suspend instead).
    async fn execute(&self, arguments: Value, state: &StateRecord, call_id: &str) -> Effect;

    /// Continuation after a `Suspend`: the external reply becomes the tool's
    /// return value. Default: tools that never suspend reject resumption.
    async fn resume(
        &self,
        reply: String,
        arguments: Value,
        state: &StateRecord,
        call_id: &str,
    ) -> Effect {
        let _ = (reply, arguments, state, call_id);
        Effect::Error(format!("tool `{}` does not accept resumed input", self.name()))
    }

    /// Spec for binding this tool to a model.
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Closed registry mapping tool name to handler.
///
/// Unknown names at dispatch time become `Effect::Error`s, never faults; the
/// registry is fixed when the graph is built.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its own name; replaces any previous handler.
    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Specs of every registered tool, for model binding.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|t| t.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }
}

/// Validates call arguments against a tool's declared JSON schema.
///
/// Checks that `arguments` is an object, that every `required` key is
/// present, and that primitive property types (`string`, `integer`, `number`,
/// `boolean`) match. Returns a message suitable for an `Effect::Error`.
pub fn validate_arguments(spec: &ToolSpec, arguments: &Value) -> Result<(), String> {
    let Some(args) = arguments.as_object() else {
        return Err(format!("arguments for `{}` must be a JSON object", spec.name));
    };
    let schema = &spec.parameters;
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for key in required.iter().filter_map(Value::as_str) {
            if !args.contains_key(key) {
                return Err(format!("missing required argument `{}`", key));
            }
        }
    }
    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        for (key, value) in args {
            let Some(decl) = props.get(key) else {
                return Err(format!("unexpected argument `{}`", key));
            };
            let ok = match decl.get("type").and_then(Value::as_str) {
                Some("string") => value.is_string(),
                Some("integer") => value.is_i64() || value.is_u64(),
                Some("number") => value.is_number(),
                Some("boolean") => value.is_boolean(),
                _ => true,
            };
            if !ok {
                return Err(format!(
                    "argument `{}` has the wrong type (expected {})",
                    key,
                    decl.get("type").and_then(Value::as_str).unwrap_or("any")
                ));
            }
        }
    }
    Ok(())
}
