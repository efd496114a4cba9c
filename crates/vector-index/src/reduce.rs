use crate::error::{IndexError, Result};
use crate::index::VectorIndex;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const SEED: u64 = 42;
const POWER_ITERATIONS: usize = 200;

/// Default t-SNE parameters, overridable through the seeded entry point.
pub const DEFAULT_TSNE_PERPLEXITY: f32 = 30.0;
pub const DEFAULT_TSNE_ITERATIONS: usize = 500;

const TSNE_LEARNING_RATE: f32 = 200.0;
const TSNE_EXAGGERATION: f32 = 4.0;
const TSNE_EXAGGERATION_ITERS: usize = 100;

/// Dimensionality-reduction algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReductionMethod {
    Pca,
    Tsne,
}

impl FromStr for ReductionMethod {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pca" => Ok(Self::Pca),
            "tsne" => Ok(Self::Tsne),
            other => Err(IndexError::UnknownReduction(other.to_string())),
        }
    }
}

impl VectorIndex {
    /// Project rows down to `n_components` with the chosen method.
    pub fn reduce_dimensions(&self, method: ReductionMethod, n_components: usize) -> Array2<f32> {
        match method {
            ReductionMethod::Pca => self.reduce_pca(n_components),
            ReductionMethod::Tsne => {
                self.reduce_tsne(n_components, DEFAULT_TSNE_PERPLEXITY, DEFAULT_TSNE_ITERATIONS)
            }
        }
    }

    /// Principal component analysis via power iteration with deflation.
    ///
    /// When the source dimensionality is already at or below the target the
    /// matrix is returned unchanged.
    pub fn reduce_pca(&self, n_components: usize) -> Array2<f32> {
        let n = self.len();
        let dims = self.dimension();
        if n == 0 || dims <= n_components {
            return self.matrix().to_owned();
        }

        let mean = match self.matrix().mean_axis(Axis(0)) {
            Some(mean) => mean,
            None => return self.matrix().to_owned(),
        };
        let centered = self.matrix().to_owned() - &mean;
        let mut work = centered.t().dot(&centered) / ((n as f32 - 1.0).max(1.0));

        let mut rng = StdRng::seed_from_u64(SEED);
        let mut components = Array2::<f32>::zeros((dims, n_components));
        for c in 0..n_components {
            let mut v: Array1<f32> = (0..dims).map(|_| rng.random::<f32>() - 0.5).collect();
            if !normalize_in_place(&mut v) {
                break;
            }
            for _ in 0..POWER_ITERATIONS {
                let next = work.dot(&v);
                let norm = next.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm < 1e-12 {
                    break; // remaining variance exhausted
                }
                v = next / norm;
            }
            let eigenvalue = v.dot(&work.dot(&v));
            let outer = v
                .clone()
                .insert_axis(Axis(1))
                .dot(&v.clone().insert_axis(Axis(0)));
            work = work - outer * eigenvalue;
            components.column_mut(c).assign(&v);
        }

        centered.dot(&components)
    }

    /// t-SNE embedding with symmetric affinities and momentum gradient
    /// descent. The perplexity is clamped down to `(rows - 1) / 3` so small
    /// indices stay valid; output is deterministic for a given seed.
    pub fn reduce_tsne(&self, n_components: usize, perplexity: f32, iterations: usize) -> Array2<f32> {
        let n = self.len();
        if n == 0 {
            return Array2::zeros((0, n_components));
        }
        if n == 1 {
            return Array2::zeros((1, n_components));
        }

        let max_usable = ((n - 1) as f32 / 3.0).max(1.0);
        let perplexity = perplexity.min(max_usable);
        log::debug!("tsne: {n} rows, perplexity {perplexity:.2}, {iterations} iterations");

        let d2 = self.pairwise_squared_distances();
        let mut p = joint_probabilities(&d2, perplexity);
        p.mapv_inplace(|x| (x * TSNE_EXAGGERATION).max(1e-12));

        let mut rng = StdRng::seed_from_u64(SEED);
        let mut y = Array2::from_shape_fn((n, n_components), |_| (rng.random::<f32>() - 0.5) * 1e-3);
        let mut velocity = Array2::<f32>::zeros((n, n_components));

        for iter in 0..iterations {
            if iter == TSNE_EXAGGERATION_ITERS {
                p.mapv_inplace(|x| (x / TSNE_EXAGGERATION).max(1e-12));
            }

            // Student-t affinities in the embedding.
            let mut q_num = Array2::<f32>::zeros((n, n));
            let mut q_sum = 0.0f32;
            for i in 0..n {
                for j in (i + 1)..n {
                    let mut dist = 0.0;
                    for c in 0..n_components {
                        let diff = y[[i, c]] - y[[j, c]];
                        dist += diff * diff;
                    }
                    let num = 1.0 / (1.0 + dist);
                    q_num[[i, j]] = num;
                    q_num[[j, i]] = num;
                    q_sum += 2.0 * num;
                }
            }
            let q_sum = q_sum.max(1e-12);

            let momentum = if iter < 250 { 0.5 } else { 0.8 };
            for i in 0..n {
                let mut grad = vec![0.0f32; n_components];
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let q = (q_num[[i, j]] / q_sum).max(1e-12);
                    let mult = (p[[i, j]] - q) * q_num[[i, j]];
                    for (c, g) in grad.iter_mut().enumerate() {
                        *g += 4.0 * mult * (y[[i, c]] - y[[j, c]]);
                    }
                }
                for (c, g) in grad.iter().enumerate() {
                    velocity[[i, c]] = momentum * velocity[[i, c]] - TSNE_LEARNING_RATE * g;
                    y[[i, c]] += velocity[[i, c]];
                }
            }
        }

        y
    }

    fn pairwise_squared_distances(&self) -> Array2<f32> {
        let n = self.len();
        let mut d2 = Array2::<f32>::zeros((n, n));
        for i in 0..n {
            for j in (i + 1)..n {
                let d: f32 = self
                    .row(i)
                    .iter()
                    .zip(self.row(j).iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                d2[[i, j]] = d;
                d2[[j, i]] = d;
            }
        }
        d2
    }
}

/// Symmetrized conditional probabilities with per-row precision found by
/// binary search against the target entropy `ln(perplexity)`.
fn joint_probabilities(d2: &Array2<f32>, perplexity: f32) -> Array2<f32> {
    let n = d2.nrows();
    let target = perplexity.ln();
    let mut cond = Array2::<f32>::zeros((n, n));

    for i in 0..n {
        let mut beta = 1.0f32;
        let mut beta_min = f32::NEG_INFINITY;
        let mut beta_max = f32::INFINITY;
        let mut row = vec![0.0f32; n];

        for _ in 0..50 {
            let mut sum = 0.0f32;
            for j in 0..n {
                row[j] = if j == i { 0.0 } else { (-d2[[i, j]] * beta).exp() };
                sum += row[j];
            }
            let sum = sum.max(1e-12);
            let weighted: f32 = (0..n).map(|j| d2[[i, j]] * row[j]).sum();
            let entropy = sum.ln() + beta * weighted / sum;

            let diff = entropy - target;
            if diff.abs() < 1e-5 {
                break;
            }
            if diff > 0.0 {
                beta_min = beta;
                beta = if beta_max.is_finite() { (beta + beta_max) / 2.0 } else { beta * 2.0 };
            } else {
                beta_max = beta;
                beta = if beta_min.is_finite() { (beta + beta_min) / 2.0 } else { beta / 2.0 };
            }
        }

        let sum: f32 = row.iter().sum::<f32>().max(1e-12);
        for j in 0..n {
            cond[[i, j]] = row[j] / sum;
        }
    }

    // Symmetrize and renormalize over all pairs.
    let mut joint = Array2::<f32>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            joint[[i, j]] = (cond[[i, j]] + cond[[j, i]]) / (2.0 * n as f32);
        }
    }
    joint
}

fn normalize_in_place(v: &mut Array1<f32>) -> bool {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm < 1e-12 {
        return false;
    }
    v.mapv_inplace(|x| x / norm);
    true
}
