//! # Context Store
//!
//! The stateful heart of the context engine: an in-memory store that
//! deduplicates content-addressed items, relates them through typed weighted
//! links, and answers similarity, traversal, clustering, and spatial queries.
//!
//! ## Architecture
//!
//! ```text
//! caller (serving layer)
//!     │
//!     └──> ContextStore
//!            ├─ content_index: hash -> id     (dedup)
//!            ├─ items: id -> Item             (attributes)
//!            ├─ ContextGraph                  (typed arcs, traversal)
//!            └─ VectorIndex + embedded_ids    (id <-> row bijection,
//!                                              rebuilt on mutation)
//! ```
//!
//! Mutations validate their arguments first and leave every index consistent
//! before returning; queries for absent things return empty results rather
//! than errors. `SharedContextStore` wraps the store in a readers-writer
//! lock for concurrent serving.

mod config;
mod error;
mod shared;
mod snapshot;
mod store;

pub use config::EngineConfig;
pub use error::{Result, StoreError};
pub use shared::SharedContextStore;
pub use snapshot::ContextSnapshot;
pub use store::{ContextStore, StoreStatistics};

// The value and request types callers need alongside the store.
pub use context_graph::ContextGraph;
pub use context_model::{DistanceMetric, Item, ModelError, Relationship};
pub use context_vector_index::{
    ClusterSpec, IndexError, IndexStatistics, Linkage, ReductionMethod, SimilarityMetric,
    VectorIndex,
};
