//! Resolved dependency graphs.
//!
//! Nodes live in a `petgraph` arena and are addressed by [`NodeIndex`], so a
//! graph may contain cycles and shared subtrees without any reference
//! counting. Edge weights are insertion ordinals; [`DependencyGraph::children`]
//! returns children in that order, which keeps every traversal deterministic.

use crate::error::GraphError;
use ahash::AHashMap;
use coda_core::{ConflictKey, Coordinate, Scope};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outcome of conflict marking for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictTag {
    /// Not reached by the marker.
    #[default]
    Unmarked,
    /// First declaration of its conflict group.
    Winner,
    /// Shadowed by the winner of its group.
    Loser {
        /// The group's winner.
        winner: NodeIndex,
    },
}

impl ConflictTag {
    /// Whether this node won its group.
    #[must_use]
    pub const fn is_winner(self) -> bool {
        matches!(self, Self::Winner)
    }
}

/// One declaration in a dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    /// Caller-chosen id, unique within the graph.
    pub id: String,
    /// Declared coordinate.
    pub coordinate: Coordinate,
    /// Scope as declared.
    pub declared_scope: Scope,
    /// Effective scope. Equals the declared scope until scopes are propagated.
    pub scope: Scope,
    /// Conflict marking result.
    pub conflict: ConflictTag,
}

impl DependencyNode {
    /// Create an unmarked node whose effective scope is its declared scope.
    #[must_use]
    pub fn new(id: impl Into<String>, coordinate: Coordinate, scope: Scope) -> Self {
        Self {
            id: id.into(),
            coordinate,
            declared_scope: scope.clone(),
            scope,
            conflict: ConflictTag::Unmarked,
        }
    }

    /// Conflict-group key of the coordinate.
    #[must_use]
    pub fn conflict_key(&self) -> ConflictKey {
        self.coordinate.conflict_key()
    }
}

/// A rooted dependency graph.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<DependencyNode, usize>,
    ids: AHashMap<String, NodeIndex>,
    root: NodeIndex,
}

impl DependencyGraph {
    /// Create a graph holding only `root`.
    #[must_use]
    pub fn new(root: DependencyNode) -> Self {
        let mut graph = DiGraph::new();
        let mut ids = AHashMap::new();
        let id = root.id.clone();
        let root = graph.add_node(root);
        ids.insert(id, root);
        Self { graph, ids, root }
    }

    /// Add a node.
    ///
    /// # Errors
    /// Returns [`GraphError::DuplicateNode`] if the id is taken.
    pub fn add_node(&mut self, node: DependencyNode) -> Result<NodeIndex, GraphError> {
        if self.ids.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        let id = node.id.clone();
        let index = self.graph.add_node(node);
        self.ids.insert(id, index);
        Ok(index)
    }

    /// Add a dependency edge after every existing child of `from`.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        let ordinal = self.graph.edge_count();
        self.graph.add_edge(from, to, ordinal);
    }

    /// Add an edge between two nodes given by id.
    ///
    /// # Errors
    /// Returns [`GraphError::MissingNode`] if either id is undefined.
    pub fn add_edge_by_id(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        let missing = |id: &str| GraphError::MissingNode {
            from: from.to_string(),
            to: to.to_string(),
            missing: id.to_string(),
        };
        let source = self.find(from).ok_or_else(|| missing(from))?;
        let target = self.find(to).ok_or_else(|| missing(to))?;
        self.add_edge(source, target);
        Ok(())
    }

    /// The root node.
    #[must_use]
    pub const fn root(&self) -> NodeIndex {
        self.root
    }

    /// Look a node up by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<NodeIndex> {
        self.ids.get(id).copied()
    }

    /// Borrow a node.
    ///
    /// # Panics
    /// Panics if `index` does not belong to this graph.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &DependencyNode {
        &self.graph[index]
    }

    /// Mutably borrow a node.
    ///
    /// # Panics
    /// Panics if `index` does not belong to this graph.
    pub fn node_mut(&mut self, index: NodeIndex) -> &mut DependencyNode {
        &mut self.graph[index]
    }

    /// Children of `index`, in edge insertion order.
    #[must_use]
    pub fn children(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|e| (*e.weight(), e.target()))
            .collect();
        edges.sort_unstable_by_key(|(ordinal, _)| *ordinal);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    /// Nodes with an edge to `index`. Order is unspecified.
    pub fn parents(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(index, Direction::Incoming)
    }

    /// Every node index, in insertion order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    /// Every node, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &DependencyNode> {
        self.graph.node_weights()
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Always false: a graph has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Load a graph document from disk.
    ///
    /// # Errors
    /// Returns [`GraphError::Io`] if the file cannot be read, otherwise see
    /// [`Self::from_json`].
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path).map_err(|e| GraphError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Parse a graph document:
    /// `{"root": id, "nodes": [{"id", "coordinate", "scope"}], "edges": [[from, to]]}`.
    ///
    /// A node without a scope gets `compile`.
    ///
    /// # Errors
    /// Returns [`GraphError::Json`] for malformed JSON or coordinates, and
    /// the structural variants for undefined or duplicate ids.
    pub fn from_json(content: &str) -> Result<Self, GraphError> {
        let document: GraphDocument =
            sonic_rs::from_str(content).map_err(|e| GraphError::Json(e.to_string()))?;
        Self::from_document(document)
    }

    /// Build a graph from a parsed document.
    ///
    /// # Errors
    /// See [`Self::from_json`].
    pub fn from_document(document: GraphDocument) -> Result<Self, GraphError> {
        let mut nodes = Vec::with_capacity(document.nodes.len());
        for entry in document.nodes {
            let coordinate = Coordinate::parse(&entry.coordinate)
                .map_err(|e| GraphError::Json(format!("node '{}': {e}", entry.id)))?;
            let scope = entry.scope.as_deref().map_or_else(Scope::default, Scope::new);
            nodes.push(DependencyNode::new(entry.id, coordinate, scope));
        }

        let root_at = nodes
            .iter()
            .position(|n| n.id == document.root)
            .ok_or_else(|| GraphError::UnknownRoot(document.root.clone()))?;
        let root = nodes.remove(root_at);
        let mut graph = Self::new(root);
        for node in nodes {
            graph.add_node(node)?;
        }
        for (from, to) in &document.edges {
            graph.add_edge_by_id(from, to)?;
        }
        Ok(graph)
    }

    /// Describe the graph, including conflict tags and effective scopes.
    #[must_use]
    pub fn to_document(&self) -> GraphDocument {
        let nodes = self
            .graph
            .node_weights()
            .map(|node| NodeDocument {
                id: node.id.clone(),
                coordinate: node.coordinate.to_string(),
                scope: Some(node.declared_scope.to_string()),
                effective_scope: Some(node.scope.to_string()),
                conflict: Some(
                    match node.conflict {
                        ConflictTag::Unmarked => "unmarked",
                        ConflictTag::Winner => "winner",
                        ConflictTag::Loser { .. } => "loser",
                    }
                    .to_string(),
                ),
                winner: match node.conflict {
                    ConflictTag::Loser { winner } => Some(self.graph[winner].id.clone()),
                    _ => None,
                },
            })
            .collect();
        let mut edges: Vec<_> = self.graph.edge_references().collect();
        edges.sort_unstable_by_key(|e| *e.weight());
        let edges = edges
            .into_iter()
            .map(|e| {
                (
                    self.graph[e.source()].id.clone(),
                    self.graph[e.target()].id.clone(),
                )
            })
            .collect();
        GraphDocument {
            root: self.graph[self.root].id.clone(),
            nodes,
            edges,
        }
    }

    /// Serialize [`Self::to_document`] as pretty JSON.
    ///
    /// # Errors
    /// Returns [`GraphError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, GraphError> {
        sonic_rs::to_string_pretty(&self.to_document()).map_err(|e| GraphError::Json(e.to_string()))
    }
}

/// Serialized graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Id of the root node.
    pub root: String,
    /// Nodes.
    pub nodes: Vec<NodeDocument>,
    /// `[from, to]` id pairs, in child order.
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

/// Serialized node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDocument {
    /// Node id.
    pub id: String,
    /// Coordinate in reference grammar.
    pub coordinate: String,
    /// Declared scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Effective scope (output only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_scope: Option<String>,
    /// `winner`, `loser` or `unmarked` (output only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<String>,
    /// Id of the winner shadowing this node (output only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}
