use context_model::Relationship;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use std::collections::HashMap;
use std::sync::Arc;

/// Edge payload: a shared handle to the relationship record.
///
/// An undirected relationship is materialized as two reciprocal arcs whose
/// `EdgeData` values point at the same `Arc<Relationship>`.
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub relationship: Arc<Relationship>,
}

impl EdgeData {
    pub fn new(relationship: Arc<Relationship>) -> Self {
        Self { relationship }
    }

    pub fn relationship_type(&self) -> &str {
        &self.relationship.relationship_type
    }

    pub fn weight(&self) -> f32 {
        self.relationship.weight
    }
}

/// Directed multigraph over item ids.
///
/// Backed by a `StableDiGraph` so node indices stay valid across removals,
/// keeping the id index usable without rebuilds.
pub struct ContextGraph {
    pub(crate) graph: StableDiGraph<String, EdgeData>,
    pub(crate) node_index: HashMap<String, NodeIndex>,
}

impl ContextGraph {
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            node_index: HashMap::new(),
        }
    }

    /// Add a node for the id if not already present.
    pub fn add_node(&mut self, id: impl Into<String>) -> NodeIndex {
        let id = id.into();
        if let Some(&idx) = self.node_index.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(id.clone());
        self.node_index.insert(id, idx);
        idx
    }

    /// Remove a node and every incident arc. Returns false for unknown ids.
    pub fn remove_node(&mut self, id: &str) -> bool {
        match self.node_index.remove(id) {
            Some(idx) => {
                self.graph.remove_node(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Arc count; an undirected relationship contributes two.
    pub fn arc_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.node_index.get(id).copied()
    }
}

impl Default for ContextGraph {
    fn default() -> Self {
        Self::new()
    }
}
