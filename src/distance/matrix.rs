//! Condensed pairwise distance matrix.

use crate::data::SampleStore;
use crate::error::{Result, StabilityError};
use crate::types::{PointId, SquareMatrix};

use super::Dissimilarity;

/// Symmetric distance matrix with a zero diagonal over a set of points.
///
/// Only the strict upper triangle is stored, row by row (the condensed
/// layout). Entry `(i, j)` with `i < j` lives at
/// `n·i − i·(i+1)/2 + (j − i − 1)`.
///
/// Positions `0..n` refer to the matrix rows; [`DistanceMatrix::ids`] maps a
/// position back to the sample point it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    ids: Vec<PointId>,
    condensed: Vec<f64>,
}

impl DistanceMatrix {
    /// Compute the distances between the store points at `indices`.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` for fewer than two indices and
    /// `InvalidSample` for an index outside the store.
    pub fn build(store: &SampleStore, indices: &[usize], metric: &dyn Dissimilarity) -> Result<Self> {
        if indices.len() < 2 {
            return Err(StabilityError::InsufficientData {
                required: 2,
                actual: indices.len(),
            });
        }

        let points = indices
            .iter()
            .map(|&i| {
                store.get(i).ok_or_else(|| {
                    StabilityError::sample(format!(
                        "index {} out of range for store of {} points",
                        i,
                        store.len()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let n = points.len();
        let mut condensed = Vec::with_capacity(n * (n - 1) / 2);
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                condensed.push(metric.distance(a.features(), b.features()));
            }
        }

        Ok(Self {
            ids: points.iter().map(|p| p.id()).collect(),
            condensed,
        })
    }

    /// Compute the distances between all points in the store.
    pub fn full(store: &SampleStore, metric: &dyn Dissimilarity) -> Result<Self> {
        let indices: Vec<usize> = (0..store.len()).collect();
        Self::build(store, &indices, metric)
    }

    /// Wrap precomputed condensed distances.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` for fewer than two ids and `Clustering` if
    /// the number of values does not match `n·(n−1)/2`.
    pub fn from_condensed(ids: Vec<PointId>, condensed: Vec<f64>) -> Result<Self> {
        let n = ids.len();
        if n < 2 {
            return Err(StabilityError::InsufficientData {
                required: 2,
                actual: n,
            });
        }
        if condensed.len() != n * (n - 1) / 2 {
            return Err(StabilityError::clustering(format!(
                "{} condensed entries do not describe a {}x{} matrix",
                condensed.len(),
                n,
                n
            )));
        }
        Ok(Self { ids, condensed })
    }

    /// Wrap a square matrix, checking shape, symmetry and the zero diagonal.
    pub fn from_square(ids: Vec<PointId>, square: &SquareMatrix) -> Result<Self> {
        let n = ids.len();
        if square.nrows() != n || square.ncols() != n {
            return Err(StabilityError::clustering(format!(
                "{}x{} matrix for {} points",
                square.nrows(),
                square.ncols(),
                n
            )));
        }
        let mut condensed = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            if square[(i, i)] != 0.0 {
                return Err(StabilityError::clustering(format!(
                    "non-zero diagonal entry {} at {}",
                    square[(i, i)],
                    i
                )));
            }
            for j in i + 1..n {
                let (upper, lower) = (square[(i, j)], square[(j, i)]);
                // NaN entries pass through; the clusterer rejects them
                if upper != lower && !(upper.is_nan() && lower.is_nan()) {
                    return Err(StabilityError::clustering(format!(
                        "matrix not symmetric at ({}, {})",
                        i, j
                    )));
                }
                condensed.push(upper);
            }
        }
        Self::from_condensed(ids, condensed)
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the matrix has no points. Always false for a built matrix.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Point identifiers by matrix position.
    pub fn ids(&self) -> &[PointId] {
        &self.ids
    }

    /// Distance between positions `i` and `j`.
    ///
    /// # Panics
    ///
    /// Panics if either position is out of range.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let n = self.len();
        assert!(i < n && j < n, "position out of range for {} points", n);
        match i.cmp(&j) {
            std::cmp::Ordering::Equal => 0.0,
            std::cmp::Ordering::Less => self.condensed[condensed_index(n, i, j)],
            std::cmp::Ordering::Greater => self.condensed[condensed_index(n, j, i)],
        }
    }

    /// The condensed upper-triangle values.
    pub fn condensed(&self) -> &[f64] {
        &self.condensed
    }

    /// Expand to a dense square matrix.
    pub fn to_square(&self) -> SquareMatrix {
        let n = self.len();
        SquareMatrix::from_fn(n, n, |i, j| self.get(i, j))
    }

    /// Largest pairwise distance.
    pub fn max_distance(&self) -> f64 {
        self.condensed.iter().copied().fold(0.0, f64::max)
    }

    /// Check that every entry is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDistance` naming the first offending entry.
    pub fn check_finite(&self) -> Result<()> {
        let n = self.len();
        let mut k = 0;
        for i in 0..n {
            for j in i + 1..n {
                let value = self.condensed[k];
                if !value.is_finite() || value < 0.0 {
                    return Err(StabilityError::InvalidDistance { row: i, col: j, value });
                }
                k += 1;
            }
        }
        Ok(())
    }
}

#[inline]
fn condensed_index(n: usize, i: usize, j: usize) -> usize {
    n * i - i * (i + 1) / 2 + (j - i - 1)
}
