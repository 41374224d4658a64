//! State graph builder: nodes + explicit edges (from → to).
//!
//! Add nodes with `add_node`, wire them with `add_edge(from, to)` and
//! `add_conditional_edges(from, router, path_map)` using `START` and `END`
//! for graph entry/exit, then `compile()` to get a [`CompiledGraph`]. Cycles
//! are legal — the step-budget counter bounds them at run time.

use std::collections::HashMap;
use std::sync::Arc;

use crate::state::StateSchema;

use super::compile_error::CompilationError;
use super::compiled::{CompiledGraph, NextEntry};
use super::conditional::{ConditionalRouter, RouterFn};
use super::node::Node;

/// Sentinel for graph entry: use as `from` in `add_edge(START, first_node)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to` in `add_edge(last_node, END)` or as a
/// conditional target. A node with no outgoing route at all is equivalent to
/// routing to END (a sink).
pub const END: &str = "__end__";

/// Mutable graph under construction: schema, nodes, edges.
///
/// The schema is fixed here — the channel set a graph reads and writes is
/// closed at compile time and also defines the view a parent graph hands this
/// graph when it runs as a sub-graph node.
pub struct StateGraph {
    name: String,
    schema: Arc<StateSchema>,
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: Vec<(String, String)>,
    conditional: HashMap<String, ConditionalRouter>,
}

impl StateGraph {
    /// Creates an empty graph over the given schema.
    pub fn new(name: impl Into<String>, schema: Arc<StateSchema>) -> Self {
        Self {
            name: name.into(),
            schema,
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional: HashMap::new(),
        }
    }

    /// Adds a node; id must be unique. Replaces if same id.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds a static edge from `from` to `to` (use START / END sentinels).
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    /// Adds conditional edges from `from`: after the node's update merges,
    /// `router` picks the routing key, optionally translated through
    /// `path_map` to a destination node id (or END).
    pub fn add_conditional_edges(
        &mut self,
        from: impl Into<String>,
        router: RouterFn,
        path_map: Option<HashMap<String, String>>,
    ) -> &mut Self {
        self.conditional
            .insert(from.into(), ConditionalRouter::new(router, path_map));
        self
    }

    /// Builds the executable graph.
    ///
    /// Validates that all referenced node ids exist, that exactly one edge
    /// leaves START, and that each node routes one way only.
    pub fn compile(self) -> Result<CompiledGraph, CompilationError> {
        for (from, to) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(CompilationError::NodeNotFound(from.clone()));
            }
            if to != END && !self.nodes.contains_key(to) {
                return Err(CompilationError::NodeNotFound(to.clone()));
            }
        }
        for (from, router) in &self.conditional {
            if !self.nodes.contains_key(from) {
                return Err(CompilationError::NodeNotFound(from.clone()));
            }
            if let Some(targets) = router.targets() {
                for target in targets {
                    if target != END && !self.nodes.contains_key(target) {
                        return Err(CompilationError::NodeNotFound(target.to_string()));
                    }
                }
            }
        }

        let start_edges: Vec<_> = self
            .edges
            .iter()
            .filter(|(f, _)| f == START)
            .map(|(_, t)| t.clone())
            .collect();
        if start_edges.len() != 1 {
            return Err(CompilationError::MissingStart);
        }
        let first = start_edges.into_iter().next().expect("one start edge");

        let mut next_map: HashMap<String, NextEntry> = HashMap::new();
        for (from, to) in &self.edges {
            if from == START {
                continue;
            }
            if self.conditional.contains_key(from) || next_map.contains_key(from) {
                return Err(CompilationError::ConflictingRoutes(from.clone()));
            }
            next_map.insert(from.clone(), NextEntry::Unconditional(to.clone()));
        }
        for (from, router) in self.conditional {
            if next_map.contains_key(&from) {
                return Err(CompilationError::ConflictingRoutes(from));
            }
            next_map.insert(from, NextEntry::Conditional(router));
        }

        Ok(CompiledGraph::new(
            self.name,
            self.schema,
            self.nodes,
            first,
            next_map,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::FnNode;
    use crate::state::StateUpdate;

    fn nop() -> Arc<dyn Node> {
        Arc::new(FnNode::new(|_| Ok(StateUpdate::new())))
    }

    fn schema() -> Arc<StateSchema> {
        Arc::new(StateSchema::builder().text("color").build())
    }

    /// **Scenario**: an edge to an unregistered node fails compilation.
    #[test]
    fn compile_unknown_node_fails() {
        let mut g = StateGraph::new("g", schema());
        g.add_node("a", nop());
        g.add_edge(START, "a");
        g.add_edge("a", "missing");
        assert!(matches!(
            g.compile(),
            Err(CompilationError::NodeNotFound(n)) if n == "missing"
        ));
    }

    /// **Scenario**: zero or two START edges fail compilation.
    #[test]
    fn compile_requires_single_start() {
        let mut g = StateGraph::new("g", schema());
        g.add_node("a", nop());
        assert!(matches!(g.compile(), Err(CompilationError::MissingStart)));

        let mut g = StateGraph::new("g", schema());
        g.add_node("a", nop());
        g.add_node("b", nop());
        g.add_edge(START, "a");
        g.add_edge(START, "b");
        assert!(matches!(g.compile(), Err(CompilationError::MissingStart)));
    }

    /// **Scenario**: a node with both a static edge and conditional edges is rejected.
    #[test]
    fn compile_conflicting_routes_fails() {
        let mut g = StateGraph::new("g", schema());
        g.add_node("a", nop());
        g.add_node("b", nop());
        g.add_edge(START, "a");
        g.add_edge("a", "b");
        g.add_conditional_edges(
            "a",
            Arc::new(|_: &crate::state::StateRecord| END.to_string()),
            None,
        );
        assert!(matches!(
            g.compile(),
            Err(CompilationError::ConflictingRoutes(n)) if n == "a"
        ));
    }

    /// **Scenario**: a conditional path map naming an unknown node is rejected.
    #[test]
    fn compile_unknown_conditional_target_fails() {
        let mut g = StateGraph::new("g", schema());
        g.add_node("a", nop());
        g.add_edge(START, "a");
        g.add_conditional_edges(
            "a",
            Arc::new(|_: &crate::state::StateRecord| "x".to_string()),
            Some(HashMap::from([("x".to_string(), "missing".to_string())])),
        );
        assert!(matches!(
            g.compile(),
            Err(CompilationError::NodeNotFound(n)) if n == "missing"
        ));
    }

    /// **Scenario**: a cycle with an END escape compiles (budget bounds it at run time).
    #[test]
    fn compile_allows_cycles() {
        let mut g = StateGraph::new("g", schema());
        g.add_node("a", nop());
        g.add_node("b", nop());
        g.add_edge(START, "a");
        g.add_edge("a", "b");
        g.add_edge("b", "a");
        assert!(g.compile().is_ok());
    }
}
