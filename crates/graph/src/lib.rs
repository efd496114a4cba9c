//! # Context Graph
//!
//! Directed multigraph over item ids with typed, weighted arcs.
//!
//! ## Architecture
//!
//! ```text
//! Relationship (context-model)
//!     │  Arc<Relationship> shared by reciprocal arcs
//!     │
//!     └──> ContextGraph (petgraph StableDiGraph)
//!            ├─ Nodes: item ids (stable indices across removals)
//!            ├─ Arcs: EdgeData { relationship }
//!            └─ Queries: neighbors, BFS neighborhood, simple paths, density
//! ```
//!
//! The graph stores ids only; item attributes live with the owning store.

mod error;
mod graph;
mod types;

pub use error::{GraphError, Result};
pub use types::{ContextGraph, EdgeData};
