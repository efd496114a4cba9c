use crate::error::{IndexError, Result};
use crate::metric::SimilarityMetric;
use ndarray::{Array2, ArrayView1, ArrayView2};

/// Dense matrix of embeddings addressed by row offset.
///
/// The index is stateless with respect to the items that produced the rows;
/// the store owns the offset↔id mapping and rebuilds the index whenever the
/// embedded item set changes.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    matrix: Array2<f32>,
}

impl VectorIndex {
    /// An index with no rows (and no fixed dimensionality yet).
    pub fn empty() -> Self {
        Self {
            matrix: Array2::zeros((0, 0)),
        }
    }

    /// Build from row vectors; all rows must share one dimensionality.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        if rows.is_empty() {
            return Ok(Self::empty());
        }
        let dims = rows[0].len();
        for row in &rows {
            if row.len() != dims {
                return Err(IndexError::InvalidDimension {
                    expected: dims,
                    actual: row.len(),
                });
            }
        }
        let n = rows.len();
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let matrix = Array2::from_shape_vec((n, dims), flat)
            .map_err(|_| IndexError::InvalidDimension { expected: dims, actual: 0 })?;
        Ok(Self { matrix })
    }

    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.nrows() == 0
    }

    pub fn dimension(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f32> {
        self.matrix.row(index)
    }

    pub(crate) fn matrix(&self) -> ArrayView2<'_, f32> {
        self.matrix.view()
    }

    /// K nearest rows to `query`, ascending by distance.
    ///
    /// Returns `(row_index, distance)` pairs, at most `min(k, len)` of them.
    /// An empty index yields an empty result rather than an error; a query of
    /// the wrong dimensionality fails with `InvalidDimension`.
    pub fn nearest(
        &self,
        query: &[f32],
        k: usize,
        metric: SimilarityMetric,
    ) -> Result<Vec<(usize, f32)>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension() {
            return Err(IndexError::InvalidDimension {
                expected: self.dimension(),
                actual: query.len(),
            });
        }

        let q = ArrayView1::from(query);
        let mut scored: Vec<(usize, f32)> = self
            .matrix
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, row)| (i, metric.distance(q, row)))
            .collect();

        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        log::debug!(
            "nearest: {} of {} rows via {} metric",
            scored.len(),
            self.len(),
            metric
        );
        Ok(scored)
    }
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::empty()
    }
}
