//! # Context Model
//!
//! Value types for the context engine: content-addressed items and the
//! typed, weighted relationships between them.
//!
//! - **Items** are deduplicated by a canonical content hash; embeddings are
//!   stored unit-normalized and positions live in 3D space.
//! - **Relationships** validate their weight range and reject self-loops at
//!   construction; undirected links compare symmetrically.
//! - **Metrics** are closed enums with `FromStr` at the string boundary, so
//!   dispatch inside the engine is exhaustive at compile time.

mod error;
mod item;
mod metric;
mod relationship;

pub use error::{ModelError, Result};
pub use item::{content_hash, l2_normalize, Item, ID_HASH_LEN};
pub use metric::DistanceMetric;
pub use relationship::{Relationship, RelationshipBuilder};
