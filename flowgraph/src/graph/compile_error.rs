//! Graph compilation error.
//!
//! Returned by `StateGraph::compile` when the node/edge declarations cannot
//! form a runnable plan.

use thiserror::Error;

/// Error when compiling a state graph.
///
/// Validation ensures every edge endpoint (except START/END) is a registered
/// node, the entry point is unique, each node routes one way (a single static
/// edge or a single conditional router), and every declared conditional
/// target exists.
#[derive(Debug, Error)]
pub enum CompilationError {
    /// A node id in an edge or path map was never registered via `add_node`.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// No edge from START, or more than one.
    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// A node has both a static outgoing edge and conditional edges, or more
    /// than one static outgoing edge.
    #[error("node `{0}` has conflicting outgoing routes")]
    ConflictingRoutes(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display names the offending node for both node errors.
    #[test]
    fn compilation_error_display() {
        let e = CompilationError::NodeNotFound("llm".into());
        assert!(e.to_string().contains("llm"));
        let e = CompilationError::ConflictingRoutes("supervisor".into());
        assert!(e.to_string().contains("supervisor"));
        let e = CompilationError::MissingStart;
        assert!(e.to_string().contains("START"));
    }
}
