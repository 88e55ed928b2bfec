//! Immutable container of sample points.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StabilityError};
use crate::types::{PointId, SamplePoint};

/// Relative tolerance when matching coordinates to a requested value.
const PARAM_RTOL: f64 = 1e-5;
/// Absolute tolerance when matching coordinates to a requested value.
const PARAM_ATOL: f64 = 1e-8;

/// Ordered, index-addressable collection of sample points.
///
/// All points share the same coordinate and feature dimensionality, and
/// identifiers are unique. A store is never mutated once built; selections
/// such as [`SampleStore::subset`] return new stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleStore {
    points: Vec<SamplePoint>,
    param_names: Vec<String>,
}

impl SampleStore {
    /// Build a store from sample points.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSample` if feature or coordinate dimensionality differs
    /// between points, or if two points share an identifier.
    pub fn new(points: Vec<SamplePoint>) -> Result<Self> {
        if let Some(first) = points.first() {
            let nbins = first.features().len();
            let npars = first.coordinate().len();
            for point in &points {
                if point.features().len() != nbins {
                    return Err(StabilityError::sample(format!(
                        "point {} has {} features, expected {}",
                        point.id(),
                        point.features().len(),
                        nbins
                    )));
                }
                if point.coordinate().len() != npars {
                    return Err(StabilityError::sample(format!(
                        "point {} has {} coordinates, expected {}",
                        point.id(),
                        point.coordinate().len(),
                        npars
                    )));
                }
            }
        }

        let mut seen = HashSet::with_capacity(points.len());
        for point in &points {
            if !seen.insert(point.id()) {
                return Err(StabilityError::sample(format!(
                    "duplicate point identifier {}",
                    point.id()
                )));
            }
        }

        Ok(Self {
            points,
            param_names: Vec::new(),
        })
    }

    /// Build a store from parallel coordinate and feature rows, numbering the
    /// points `0..n` in row order.
    pub fn from_rows(coordinates: Vec<Vec<f64>>, features: Vec<Vec<f64>>) -> Result<Self> {
        if coordinates.len() != features.len() {
            return Err(StabilityError::sample(format!(
                "{} coordinate rows but {} feature rows",
                coordinates.len(),
                features.len()
            )));
        }
        let points = coordinates
            .into_iter()
            .zip(features)
            .enumerate()
            .map(|(i, (coordinate, features))| SamplePoint::new(PointId(i as u64), coordinate, features))
            .collect();
        Self::new(points)
    }

    /// Attach names to the parameter-space dimensions.
    pub fn with_param_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if !self.points.is_empty() && names.len() != self.npars() {
            return Err(StabilityError::sample(format!(
                "{} parameter names for {} parameters",
                names.len(),
                self.npars()
            )));
        }
        self.param_names = names;
        Ok(self)
    }

    /// Number of sample points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the store holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&SamplePoint> {
        self.points.get(index)
    }

    /// All points in store order.
    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    /// Identifiers in store order.
    pub fn ids(&self) -> Vec<PointId> {
        self.points.iter().map(SamplePoint::id).collect()
    }

    /// Feature-vector dimensionality (number of bins).
    pub fn nbins(&self) -> usize {
        self.points.first().map_or(0, |p| p.features().len())
    }

    /// Parameter-space dimensionality.
    pub fn npars(&self) -> usize {
        self.points.first().map_or(0, |p| p.coordinate().len())
    }

    /// Names of the parameter-space dimensions (empty when unnamed).
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Per-point sum of feature entries.
    pub fn norms(&self) -> Vec<f64> {
        self.points.iter().map(SamplePoint::norm).collect()
    }

    /// A copy of this store whose feature vectors are divided by their sum.
    ///
    /// Vectors summing to zero are kept as they are.
    pub fn normalized(&self) -> Self {
        let points = self
            .points
            .iter()
            .map(|p| {
                let norm = p.norm();
                if norm == 0.0 {
                    p.clone()
                } else {
                    p.with_features(p.features().iter().map(|x| x / norm).collect())
                }
            })
            .collect();
        Self {
            points,
            param_names: self.param_names.clone(),
        }
    }

    /// A new store containing the points at `indices`, in the given order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSample` for an out-of-range or repeated index.
    pub fn subset(&self, indices: &[usize]) -> Result<Self> {
        let mut seen = HashSet::with_capacity(indices.len());
        let mut points = Vec::with_capacity(indices.len());
        for &index in indices {
            let point = self.points.get(index).ok_or_else(|| {
                StabilityError::sample(format!(
                    "index {} out of range for store of {} points",
                    index,
                    self.len()
                ))
            })?;
            if !seen.insert(index) {
                return Err(StabilityError::sample(format!("index {} selected twice", index)));
            }
            points.push(point.clone());
        }
        Ok(Self {
            points,
            param_names: self.param_names.clone(),
        })
    }

    /// Keep only the points lying on requested parameter values.
    ///
    /// Each constraint is a parameter index with a list of wanted values. A
    /// wanted value selects the points whose coordinate equals the available
    /// value nearest to it. A point is kept if it matches one wanted value of
    /// every constraint.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSample` for an out-of-range parameter index, an empty
    /// value list, or when no point survives the selection.
    pub fn fix_param(&self, constraints: &[(usize, Vec<f64>)]) -> Result<Self> {
        let mut selector = vec![true; self.len()];

        for (param, values) in constraints {
            if *param >= self.npars() {
                return Err(StabilityError::sample(format!(
                    "parameter index {} out of range ({} parameters)",
                    param,
                    self.npars()
                )));
            }
            if values.is_empty() {
                return Err(StabilityError::sample(format!(
                    "no values requested for parameter {}",
                    param
                )));
            }

            let column: Vec<f64> = self.points.iter().map(|p| p.coordinate()[*param]).collect();
            let mut param_selector = vec![false; self.len()];
            for &value in values {
                let nearest = column
                    .iter()
                    .copied()
                    .min_by(|a, b| (a - value).abs().total_cmp(&(b - value).abs()));
                let Some(nearest) = nearest else { continue };
                for (selected, &available) in param_selector.iter_mut().zip(&column) {
                    *selected |= is_close(available, nearest);
                }
            }
            for (keep, matched) in selector.iter_mut().zip(param_selector) {
                *keep &= matched;
            }
        }

        let indices: Vec<usize> = selector
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        if indices.is_empty() {
            return Err(StabilityError::sample("parameter selection matched no points"));
        }
        self.subset(&indices)
    }
}

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= PARAM_ATOL + PARAM_RTOL * b.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_store() -> SampleStore {
        // 3x3 grid in parameter space, one bin per point
        let mut coordinates = Vec::new();
        let mut features = Vec::new();
        for i in 0..3 {
            for j in 0..3 {
                coordinates.push(vec![i as f64 * 0.5, j as f64]);
                features.push(vec![(i * 3 + j) as f64, 1.0]);
            }
        }
        SampleStore::from_rows(coordinates, features).unwrap()
    }

    #[test]
    fn test_rejects_mixed_dimensionality() {
        let points = vec![
            SamplePoint::new(PointId(0), vec![0.0], vec![1.0, 2.0]),
            SamplePoint::new(PointId(1), vec![0.0], vec![1.0]),
        ];
        assert!(matches!(
            SampleStore::new(points),
            Err(StabilityError::InvalidSample(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let points = vec![
            SamplePoint::new(PointId(7), vec![0.0], vec![1.0]),
            SamplePoint::new(PointId(7), vec![1.0], vec![2.0]),
        ];
        assert!(matches!(
            SampleStore::new(points),
            Err(StabilityError::InvalidSample(_))
        ));
    }

    #[test]
    fn test_dimensions() {
        let store = grid_store();
        assert_eq!(store.len(), 9);
        assert_eq!(store.nbins(), 2);
        assert_eq!(store.npars(), 2);
        assert_eq!(store.ids()[4], PointId(4));
    }

    #[test]
    fn test_param_names_must_match() {
        assert!(grid_store().with_param_names(["a"]).is_err());
        let store = grid_store().with_param_names(["CVL", "CSL"]).unwrap();
        assert_eq!(store.param_names(), &["CVL".to_string(), "CSL".to_string()]);
    }

    #[test]
    fn test_normalized_sums_to_one() {
        let store = grid_store().normalized();
        for norm in store.norms() {
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_normalized_keeps_zero_vectors() {
        let store = SampleStore::from_rows(vec![vec![0.0]], vec![vec![0.0, 0.0]]).unwrap();
        assert_eq!(store.normalized().points()[0].features(), &[0.0, 0.0]);
    }

    #[test]
    fn test_subset_preserves_ids() {
        let store = grid_store();
        let sub = store.subset(&[8, 2]).unwrap();
        assert_eq!(sub.ids(), vec![PointId(8), PointId(2)]);
        assert!(store.subset(&[9]).is_err());
        assert!(store.subset(&[1, 1]).is_err());
    }

    #[test]
    fn test_fix_param_nearest_value() {
        let store = grid_store();
        // 0.6 is nearest to the available value 0.5
        let fixed = store.fix_param(&[(0, vec![0.6])]).unwrap();
        assert_eq!(fixed.len(), 3);
        assert!(fixed.points().iter().all(|p| p.coordinate()[0] == 0.5));

        let fixed = store.fix_param(&[(0, vec![0.0, 1.0]), (1, vec![2.0])]).unwrap();
        assert_eq!(fixed.ids(), vec![PointId(2), PointId(8)]);
    }

    #[test]
    fn test_fix_param_bad_index() {
        assert!(grid_store().fix_param(&[(5, vec![0.0])]).is_err());
        assert!(grid_store().fix_param(&[(0, vec![])]).is_err());
    }
}
