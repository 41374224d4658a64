//! Conditional edges: route to the next node based on the merged state.
//!
//! A source node can carry a routing function that takes the state after its
//! update merged and returns a key; the key is either used as the next node
//! id directly or looked up in an optional path map.
//!
//! **Interaction**: stored by `StateGraph::add_conditional_edges`; resolved
//! by the `CompiledGraph` run loop after the source node's update merges.

use std::collections::HashMap;
use std::sync::Arc;

use crate::state::StateRecord;

use super::state_graph::END;

/// Router function: pure predicate over the merged state returning a routing key.
pub type RouterFn = Arc<dyn Fn(&StateRecord) -> String + Send + Sync>;

/// Conditional edge definition: routing function plus optional path map.
///
/// - When `path_map` is `None`, the router's return value is used directly as
///   the next node id (or END).
/// - When `path_map` is `Some(map)`, the return value is looked up in the
///   map; keys not present fall back to being used as node ids directly.
#[derive(Clone)]
pub struct ConditionalRouter {
    path: RouterFn,
    path_map: Option<HashMap<String, String>>,
}

impl ConditionalRouter {
    pub fn new(path: RouterFn, path_map: Option<HashMap<String, String>>) -> Self {
        Self { path, path_map }
    }

    /// Resolves the next node id (or END) from the current state.
    pub fn resolve_next(&self, state: &StateRecord) -> String {
        let key = (self.path)(state);
        self.path_map
            .as_ref()
            .and_then(|m| m.get(&key))
            .cloned()
            .unwrap_or(key)
    }

    /// Declared targets, for compile-time validation. `None` when the router
    /// has no path map (targets are open; validated per graph instead).
    pub(super) fn targets(&self) -> Option<impl Iterator<Item = &str>> {
        self.path_map
            .as_ref()
            .map(|m| m.values().map(String::as_str))
    }
}

/// Standard tool router: `"tools"` when the last message of `channel` carries
/// tool-call requests, END otherwise.
///
/// Only the most recent message governs — earlier messages with pending calls
/// do not re-route. The channel inspected here must be the channel the source
/// node writes to (the builders in `supervisor` enforce this).
pub fn tools_condition(channel: impl Into<String>) -> RouterFn {
    let channel = channel.into();
    Arc::new(move |state: &StateRecord| {
        match state.last_message(&channel) {
            Some(msg) if msg.has_tool_calls() => "tools".to_string(),
            _ => END.to_string(),
        }
    })
}
