//! # Context Vector Index
//!
//! Dense-vector operations over an embedding matrix, independent of graph
//! semantics. Rows are addressed by positional offset; the owning store maps
//! offsets back to item ids.
//!
//! ## Operations
//!
//! - **Nearest neighbors** - brute-force scan under cosine/euclidean/
//!   manhattan/chebyshev distance, ascending
//! - **Clustering** - k-means++, DBSCAN (noise label `-1`), agglomerative
//!   with single/complete/average linkage
//! - **Dimensionality reduction** - PCA (power iteration) and t-SNE
//! - **Statistics** - per-dimension and row-norm summaries

mod cluster;
mod error;
mod index;
mod metric;
mod reduce;
mod stats;

pub use cluster::{ClusterSpec, Linkage, NOISE};
pub use error::{IndexError, Result};
pub use index::VectorIndex;
pub use metric::{cosine_similarity, SimilarityMetric};
pub use reduce::{ReductionMethod, DEFAULT_TSNE_ITERATIONS, DEFAULT_TSNE_PERPLEXITY};
pub use stats::IndexStatistics;
