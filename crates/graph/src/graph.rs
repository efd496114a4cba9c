use crate::error::{GraphError, Result};
use crate::types::{ContextGraph, EdgeData};
use context_model::Relationship;
use petgraph::visit::EdgeRef;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

impl ContextGraph {
    /// Insert one directed arc carrying the shared relationship payload.
    /// Both endpoints must already be nodes.
    pub fn add_arc(&mut self, source: &str, target: &str, relationship: Arc<Relationship>) -> Result<()> {
        let from = self
            .index_of(source)
            .ok_or_else(|| GraphError::NodeNotFound(source.to_string()))?;
        let to = self
            .index_of(target)
            .ok_or_else(|| GraphError::NodeNotFound(target.to_string()))?;
        self.graph.add_edge(from, to, EdgeData::new(relationship));
        Ok(())
    }

    /// Direct successors of a node, deduped, optionally filtered by
    /// relationship type. Unknown ids yield an empty list.
    pub fn neighbors(&self, id: &str, relationship_type: Option<&str>) -> Vec<String> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for edge in self.graph.edges(idx) {
            if let Some(wanted) = relationship_type {
                if edge.weight().relationship_type() != wanted {
                    continue;
                }
            }
            let neighbor = &self.graph[edge.target()];
            if seen.insert(neighbor.clone()) {
                out.push(neighbor.clone());
            }
        }
        out
    }

    /// Breadth-first expansion up to `max_depth` hops, excluding the start
    /// node. Each hop honors the optional type filter; expansion stops early
    /// once a layer adds nothing new.
    pub fn neighborhood(&self, id: &str, relationship_type: Option<&str>, max_depth: usize) -> Vec<String> {
        let Some(start) = self.index_of(id) else {
            return Vec::new();
        };

        let mut visited = HashSet::from([start]);
        let mut frontier = VecDeque::from([start]);
        let mut out = Vec::new();

        for _ in 0..max_depth {
            let mut next = VecDeque::new();
            while let Some(current) = frontier.pop_front() {
                for edge in self.graph.edges(current) {
                    if let Some(wanted) = relationship_type {
                        if edge.weight().relationship_type() != wanted {
                            continue;
                        }
                    }
                    let target = edge.target();
                    if visited.insert(target) {
                        out.push(self.graph[target].clone());
                        next.push_back(target);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        out
    }

    /// All simple paths (no repeated nodes) from `source` to `target`,
    /// optionally capped at `max_hops` edges. Absent endpoints or no route
    /// give an empty list rather than an error.
    pub fn simple_paths(&self, source: &str, target: &str, max_hops: Option<usize>) -> Vec<Vec<String>> {
        let (Some(from), Some(to)) = (self.index_of(source), self.index_of(target)) else {
            return Vec::new();
        };
        if from == to {
            return vec![vec![self.graph[from].clone()]];
        }
        let cap = max_hops.unwrap_or(usize::MAX);
        if cap == 0 {
            return Vec::new();
        }

        let mut paths = Vec::new();
        let mut stack = vec![from];
        let mut on_path: HashSet<_> = HashSet::from([from]);
        self.dfs_paths(from, to, cap, &mut stack, &mut on_path, &mut paths);
        log::debug!("simple_paths: {} path(s) from {source} to {target}", paths.len());
        paths
    }

    fn dfs_paths(
        &self,
        current: petgraph::stable_graph::NodeIndex,
        goal: petgraph::stable_graph::NodeIndex,
        remaining: usize,
        stack: &mut Vec<petgraph::stable_graph::NodeIndex>,
        on_path: &mut HashSet<petgraph::stable_graph::NodeIndex>,
        paths: &mut Vec<Vec<String>>,
    ) {
        for edge in self.graph.edges(current) {
            let next = edge.target();
            if next == goal {
                let mut path: Vec<String> = stack.iter().map(|&i| self.graph[i].clone()).collect();
                path.push(self.graph[goal].clone());
                paths.push(path);
                continue;
            }
            if remaining > 1 && !on_path.contains(&next) {
                stack.push(next);
                on_path.insert(next);
                self.dfs_paths(next, goal, remaining - 1, stack, on_path, paths);
                on_path.remove(&next);
                stack.pop();
            }
        }
    }

    /// Directed graph density `m / (n * (n - 1))`; 0.0 below two nodes.
    pub fn density(&self) -> f64 {
        let n = self.node_count();
        if n < 2 {
            return 0.0;
        }
        self.arc_count() as f64 / (n as f64 * (n as f64 - 1.0))
    }
}
