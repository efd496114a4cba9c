use context_vector_index::{DEFAULT_TSNE_ITERATIONS, DEFAULT_TSNE_PERPLEXITY};
use serde::{Deserialize, Serialize};

/// Engine tunables. Every field has a default so partial configs
/// deserialize; an all-default config reproduces the stock behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Result cap for `spatial_window` when the caller does not pass one.
    pub spatial_max_items: usize,

    /// Lloyd iteration budget for k-means clustering.
    pub kmeans_max_iter: usize,

    /// t-SNE perplexity before the small-index clamp.
    pub tsne_perplexity: f32,

    /// t-SNE gradient-descent iterations.
    pub tsne_iterations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            spatial_max_items: 50,
            kmeans_max_iter: 100,
            tsne_perplexity: DEFAULT_TSNE_PERPLEXITY,
            tsne_iterations: DEFAULT_TSNE_ITERATIONS,
        }
    }
}
