use crate::error::{IndexError, Result};
use crate::index::VectorIndex;
use crate::metric::SimilarityMetric;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::str::FromStr;

/// Label given to rows DBSCAN considers noise.
pub const NOISE: i64 = -1;

const UNCLASSIFIED: i64 = -2;
const DEFAULT_N_CLUSTERS: usize = 5;
const DEFAULT_KMEANS_MAX_ITER: usize = 100;
const DEFAULT_SEED: u64 = 42;
const CONVERGENCE_EPS: f32 = 1e-6;

/// Linkage criterion for agglomerative clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    Single,
    Complete,
    Average,
}

impl FromStr for Linkage {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "complete" => Ok(Self::Complete),
            "average" => Ok(Self::Average),
            other => Err(IndexError::UnknownLinkage(other.to_string())),
        }
    }
}

/// Parsed clustering request: algorithm plus its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum ClusterSpec {
    KMeans { n_clusters: usize },
    Dbscan { eps: f32, min_samples: usize },
    Hierarchical { n_clusters: usize, linkage: Linkage },
}

impl ClusterSpec {
    /// Translate the string-keyed request a serving layer carries into a
    /// typed spec, applying the conventional defaults for omitted parameters.
    pub fn from_args(
        method: &str,
        n_clusters: Option<usize>,
        eps: Option<f32>,
        min_samples: Option<usize>,
        linkage: Option<&str>,
    ) -> Result<Self> {
        match method.to_ascii_lowercase().as_str() {
            "kmeans" => Ok(Self::KMeans {
                n_clusters: n_clusters.unwrap_or(DEFAULT_N_CLUSTERS),
            }),
            "dbscan" => Ok(Self::Dbscan {
                eps: eps.unwrap_or(0.5),
                min_samples: min_samples.unwrap_or(5),
            }),
            "hierarchical" => Ok(Self::Hierarchical {
                n_clusters: n_clusters.unwrap_or(DEFAULT_N_CLUSTERS),
                linkage: linkage.map(str::parse).transpose()?.unwrap_or(Linkage::Average),
            }),
            other => Err(IndexError::UnknownClusterMethod(other.to_string())),
        }
    }
}

impl VectorIndex {
    /// K-means with the default iteration budget and seed.
    ///
    /// A request for more clusters than rows clamps to `max(1, rows)` and
    /// proceeds; callers treat this as normal behavior, not an error.
    pub fn cluster_kmeans(&self, n_clusters: usize) -> Vec<i64> {
        self.cluster_kmeans_seeded(n_clusters, DEFAULT_KMEANS_MAX_ITER, DEFAULT_SEED)
    }

    /// K-means++ seeding followed by Lloyd iterations; deterministic for a
    /// given seed.
    pub fn cluster_kmeans_seeded(&self, n_clusters: usize, max_iter: usize, seed: u64) -> Vec<i64> {
        let n = self.len();
        if n == 0 {
            return Vec::new();
        }
        let k = n_clusters.clamp(1, n);
        if k != n_clusters {
            log::debug!("kmeans: clamped n_clusters {n_clusters} to {k} for {n} rows");
        }

        let dims = self.dimension();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut centroids = self.kmeans_init(k, &mut rng);
        let mut labels = vec![0usize; n];

        for _ in 0..max_iter {
            for i in 0..n {
                labels[i] = nearest_centroid(self, i, &centroids);
            }

            let mut sums = Array2::<f32>::zeros((k, dims));
            let mut counts = vec![0usize; k];
            for i in 0..n {
                let mut row = sums.row_mut(labels[i]);
                row += &self.row(i);
                counts[labels[i]] += 1;
            }

            let mut shift = 0.0f32;
            for c in 0..k {
                if counts[c] == 0 {
                    continue; // empty cluster keeps its previous centroid
                }
                let updated = sums.row(c).mapv(|x| x / counts[c] as f32);
                let moved: f32 = centroids
                    .row(c)
                    .iter()
                    .zip(updated.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                shift = shift.max(moved);
                centroids.row_mut(c).assign(&updated);
            }
            if shift < CONVERGENCE_EPS {
                break;
            }
        }

        // Final assignment against the settled centroids.
        for i in 0..n {
            labels[i] = nearest_centroid(self, i, &centroids);
        }
        labels.into_iter().map(|l| l as i64).collect()
    }

    /// DBSCAN over Euclidean neighborhoods. Rows in no dense region are
    /// labeled [`NOISE`] (`-1`). The neighborhood of a row includes the row
    /// itself when counted against `min_samples`.
    pub fn cluster_dbscan(&self, eps: f32, min_samples: usize) -> Vec<i64> {
        let n = self.len();
        let mut labels = vec![UNCLASSIFIED; n];
        let mut cluster = 0i64;

        for p in 0..n {
            if labels[p] != UNCLASSIFIED {
                continue;
            }
            let neighbors = self.region_query(p, eps);
            if neighbors.len() < min_samples {
                labels[p] = NOISE;
                continue;
            }

            labels[p] = cluster;
            let mut frontier: VecDeque<usize> = neighbors.into();
            while let Some(q) = frontier.pop_front() {
                if labels[q] == NOISE {
                    labels[q] = cluster; // border point adopted by the cluster
                }
                if labels[q] != UNCLASSIFIED {
                    continue;
                }
                labels[q] = cluster;
                let expansion = self.region_query(q, eps);
                if expansion.len() >= min_samples {
                    frontier.extend(expansion);
                }
            }
            cluster += 1;
        }

        labels
    }

    /// Agglomerative clustering down to `n_clusters` groups (clamped to
    /// `max(1, rows)`, same tolerant policy as k-means). Labels are assigned
    /// in order of each cluster's smallest row index, so output is stable.
    pub fn cluster_hierarchical(&self, n_clusters: usize, linkage: Linkage) -> Vec<i64> {
        let n = self.len();
        if n == 0 {
            return Vec::new();
        }
        let k = n_clusters.clamp(1, n);

        let mut point_dist = vec![vec![0.0f32; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = SimilarityMetric::Euclidean.distance(self.row(i), self.row(j));
                point_dist[i][j] = d;
                point_dist[j][i] = d;
            }
        }

        let mut clusters: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
        while clusters.len() > k {
            let mut best = (0usize, 1usize, f32::INFINITY);
            for a in 0..clusters.len() {
                for b in (a + 1)..clusters.len() {
                    let d = linkage_distance(&clusters[a], &clusters[b], &point_dist, linkage);
                    if d < best.2 {
                        best = (a, b, d);
                    }
                }
            }
            let merged = clusters.remove(best.1);
            clusters[best.0].extend(merged);
        }

        clusters.sort_by_key(|members| members.iter().copied().min().unwrap_or(0));
        let mut labels = vec![0i64; n];
        for (ci, members) in clusters.iter().enumerate() {
            for &m in members {
                labels[m] = ci as i64;
            }
        }
        labels
    }

    /// Dispatch on a parsed spec.
    pub fn cluster(&self, spec: &ClusterSpec) -> Vec<i64> {
        match spec {
            ClusterSpec::KMeans { n_clusters } => self.cluster_kmeans(*n_clusters),
            ClusterSpec::Dbscan { eps, min_samples } => self.cluster_dbscan(*eps, *min_samples),
            ClusterSpec::Hierarchical { n_clusters, linkage } => {
                self.cluster_hierarchical(*n_clusters, *linkage)
            }
        }
    }

    fn kmeans_init(&self, k: usize, rng: &mut StdRng) -> Array2<f32> {
        let n = self.len();
        let mut centroids = Array2::zeros((k, self.dimension()));
        centroids.row_mut(0).assign(&self.row(rng.random_range(0..n)));

        let mut dist2 = vec![f32::INFINITY; n];
        for c in 1..k {
            let prev = centroids.row(c - 1);
            for i in 0..n {
                let d: f32 = self
                    .row(i)
                    .iter()
                    .zip(prev.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                if d < dist2[i] {
                    dist2[i] = d;
                }
            }
            let total: f32 = dist2.iter().sum();
            let chosen = if total <= f32::EPSILON {
                rng.random_range(0..n)
            } else {
                // Weighted draw proportional to squared distance.
                let mut target = rng.random::<f32>() * total;
                let mut pick = n - 1;
                for (i, &d) in dist2.iter().enumerate() {
                    if target <= d {
                        pick = i;
                        break;
                    }
                    target -= d;
                }
                pick
            };
            centroids.row_mut(c).assign(&self.row(chosen));
        }
        centroids
    }

    fn region_query(&self, p: usize, eps: f32) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| SimilarityMetric::Euclidean.distance(self.row(p), self.row(i)) <= eps)
            .collect()
    }
}

fn nearest_centroid(index: &VectorIndex, row: usize, centroids: &Array2<f32>) -> usize {
    let mut best = (0usize, f32::INFINITY);
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let d: f32 = index
            .row(row)
            .iter()
            .zip(centroid.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        if d < best.1 {
            best = (c, d);
        }
    }
    best.0
}

fn linkage_distance(a: &[usize], b: &[usize], point_dist: &[Vec<f32>], linkage: Linkage) -> f32 {
    let pairs = a.iter().flat_map(|&i| b.iter().map(move |&j| point_dist[i][j]));
    match linkage {
        Linkage::Single => pairs.fold(f32::INFINITY, f32::min),
        Linkage::Complete => pairs.fold(0.0, f32::max),
        Linkage::Average => {
            let (sum, count) = pairs.fold((0.0f32, 0usize), |(s, c), d| (s + d, c + 1));
            if count == 0 {
                0.0
            } else {
                sum / count as f32
            }
        }
    }
}
