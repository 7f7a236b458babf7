//! Per-transform state shared by conflict marking and scope propagation.

use crate::graph::DependencyGraph;
use ahash::{AHashMap, AHashSet};
use coda_core::{ConflictKey, ScopePrecedence};
use petgraph::graph::NodeIndex;
use std::collections::VecDeque;

/// State for one graph transform. Not meant to be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct TransformationContext {
    visited: AHashSet<NodeIndex>,
    winners: AHashMap<ConflictKey, NodeIndex>,
    precedence: ScopePrecedence,
    passes: usize,
}

impl TransformationContext {
    /// Context using the given scope order.
    #[must_use]
    pub fn new(precedence: ScopePrecedence) -> Self {
        Self {
            precedence,
            ..Self::default()
        }
    }

    /// Scope order.
    #[must_use]
    pub const fn precedence(&self) -> &ScopePrecedence {
        &self.precedence
    }

    /// Winner chosen for a conflict group.
    #[must_use]
    pub fn winner(&self, key: &ConflictKey) -> Option<NodeIndex> {
        self.winners.get(key).copied()
    }

    /// Number of conflict groups seen.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.winners.len()
    }

    /// Passes the last scope propagation needed to settle.
    #[must_use]
    pub const fn passes(&self) -> usize {
        self.passes
    }

    pub(crate) fn winners_mut(&mut self) -> &mut AHashMap<ConflictKey, NodeIndex> {
        &mut self.winners
    }

    pub(crate) fn set_passes(&mut self, passes: usize) {
        self.passes = passes;
    }

    /// Record a visit. False if the node was already visited.
    pub(crate) fn visit(&mut self, node: NodeIndex) -> bool {
        self.visited.insert(node)
    }

    /// Nodes reachable from the root, breadth first, each once.
    ///
    /// Clears and refills the visited set.
    pub(crate) fn breadth_first(&mut self, graph: &DependencyGraph) -> Vec<NodeIndex> {
        self.visited.clear();
        let root = graph.root();
        self.visit(root);
        let mut order = Vec::with_capacity(graph.len());
        let mut queue = VecDeque::from([root]);
        while let Some(node) = queue.pop_front() {
            order.push(node);
            for child in graph.children(node) {
                if self.visit(child) {
                    queue.push_back(child);
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyNode;
    use coda_core::{Coordinate, Scope};

    #[test]
    fn breadth_first_visits_each_node_once() {
        let node = |id: &str| {
            DependencyNode::new(id, Coordinate::parse(&format!("g/{id}/1")).unwrap(), Scope::compile())
        };
        let mut graph = DependencyGraph::new(node("root"));
        let root = graph.root();
        let a = graph.add_node(node("a")).unwrap();
        let b = graph.add_node(node("b")).unwrap();
        let c = graph.add_node(node("c")).unwrap();
        graph.add_edge(root, a);
        graph.add_edge(a, c);
        graph.add_edge(root, b);
        graph.add_edge(c, a);
        graph.add_edge(b, b);

        let mut ctx = TransformationContext::default();
        assert_eq!(ctx.breadth_first(&graph), [root, a, b, c]);
        assert_eq!(ctx.breadth_first(&graph), [root, a, b, c]);
    }
}
