use crate::index::VectorIndex;
use ndarray::Axis;
use serde::{Deserialize, Serialize};

/// Summary statistics over the rows of a vector index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStatistics {
    pub rows: usize,
    pub dimensions: usize,
    pub dimension_mean: Vec<f32>,
    pub dimension_std: Vec<f32>,
    pub dimension_min: Vec<f32>,
    pub dimension_max: Vec<f32>,
    pub norm_mean: f32,
    pub norm_std: f32,
}

impl VectorIndex {
    /// Per-dimension and row-norm statistics. An empty index yields the
    /// zeroed struct (`rows == 0`), not an error.
    pub fn statistics(&self) -> IndexStatistics {
        if self.is_empty() {
            return IndexStatistics::default();
        }

        let matrix = self.matrix();
        let n = self.len();

        let mean = matrix
            .mean_axis(Axis(0))
            .map(|m| m.to_vec())
            .unwrap_or_default();
        let std = matrix.std_axis(Axis(0), 0.0).to_vec();
        let min = matrix
            .fold_axis(Axis(0), f32::INFINITY, |acc, &x| acc.min(x))
            .to_vec();
        let max = matrix
            .fold_axis(Axis(0), f32::NEG_INFINITY, |acc, &x| acc.max(x))
            .to_vec();

        let norms: Vec<f32> = matrix
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|x| x * x).sum::<f32>().sqrt())
            .collect();
        let norm_mean = norms.iter().sum::<f32>() / n as f32;
        let norm_var = norms.iter().map(|x| (x - norm_mean) * (x - norm_mean)).sum::<f32>() / n as f32;

        IndexStatistics {
            rows: n,
            dimensions: self.dimension(),
            dimension_mean: mean,
            dimension_std: std,
            dimension_min: min,
            dimension_max: max,
            norm_mean,
            norm_std: norm_var.sqrt(),
        }
    }
}
