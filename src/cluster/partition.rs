//! Cluster assignment of a set of points.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StabilityError};
use crate::types::PointId;

/// Assignment of every point in a set to exactly one cluster label.
///
/// Labels are canonical: they run from `0` to `nclusters − 1` in order of
/// first appearance, so two partitions grouping the same points the same way
/// compare equal regardless of how the clustering algorithm numbered them.
/// Labels still carry no meaning across partitions of different point sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    ids: Vec<PointId>,
    labels: Vec<usize>,
    nclusters: usize,
}

impl Partition {
    /// Build a partition from parallel id and raw label sequences.
    ///
    /// Raw labels may be any integers; they are renumbered canonically.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSample` if the lengths differ or an id repeats.
    pub fn from_labels(ids: Vec<PointId>, raw_labels: &[usize]) -> Result<Self> {
        if ids.len() != raw_labels.len() {
            return Err(StabilityError::sample(format!(
                "{} ids but {} labels",
                ids.len(),
                raw_labels.len()
            )));
        }
        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(*id) {
                return Err(StabilityError::sample(format!("point {} labelled twice", id)));
            }
        }

        Ok(Self::from_unique(ids, raw_labels))
    }

    /// Renumber `raw_labels` canonically. Callers guarantee unique ids and
    /// matching lengths.
    pub(crate) fn from_unique(ids: Vec<PointId>, raw_labels: &[usize]) -> Self {
        let mut renumber: HashMap<usize, usize> = HashMap::new();
        let labels = raw_labels
            .iter()
            .map(|raw| {
                let next = renumber.len();
                *renumber.entry(*raw).or_insert(next)
            })
            .collect();

        Self {
            ids,
            labels,
            nclusters: renumber.len(),
        }
    }

    /// Number of labelled points.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no point is labelled.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Point identifiers, in the order of the clustered matrix.
    pub fn ids(&self) -> &[PointId] {
        &self.ids
    }

    /// Canonical labels, parallel to [`Partition::ids`].
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of distinct clusters.
    pub fn nclusters(&self) -> usize {
        self.nclusters
    }

    /// Label of the point `id`, if it is part of this partition.
    pub fn label_of(&self, id: PointId) -> Option<usize> {
        self.ids.iter().position(|&p| p == id).map(|i| self.labels[i])
    }

    /// Number of points per cluster, indexed by label.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.nclusters];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    /// Iterate over `(id, label)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PointId, usize)> + '_ {
        self.ids.iter().copied().zip(self.labels.iter().copied())
    }

    /// This partition restricted to `ids`, in that order.
    ///
    /// # Errors
    ///
    /// Returns `Comparison` if some id is not part of this partition.
    pub fn restrict(&self, ids: &[PointId]) -> Result<Self> {
        let lookup: HashMap<PointId, usize> = self.iter().collect();
        let labels = ids
            .iter()
            .map(|id| {
                lookup.get(id).copied().ok_or_else(|| {
                    StabilityError::comparison(format!("point {} missing from reference partition", id))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_labels(ids.to_vec(), &labels)
            .map_err(|e| StabilityError::comparison(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u64) -> Vec<PointId> {
        (0..n).map(PointId).collect()
    }

    #[test]
    fn test_canonical_labels() {
        let p = Partition::from_labels(ids(5), &[7, 7, 3, 9, 3]).unwrap();
        assert_eq!(p.labels(), &[0, 0, 1, 2, 1]);
        assert_eq!(p.nclusters(), 3);
        assert_eq!(p.cluster_sizes(), vec![2, 2, 1]);
        assert_eq!(p.label_of(PointId(3)), Some(2));
        assert_eq!(p.label_of(PointId(10)), None);
    }

    #[test]
    fn test_equal_groupings_compare_equal() {
        let a = Partition::from_labels(ids(3), &[1, 2, 1]).unwrap();
        let b = Partition::from_labels(ids(3), &[5, 0, 5]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_duplicates_and_length_mismatch() {
        assert!(Partition::from_labels(vec![PointId(1), PointId(1)], &[0, 1]).is_err());
        assert!(Partition::from_labels(ids(2), &[0]).is_err());
    }

    #[test]
    fn test_restrict() {
        let p = Partition::from_labels(ids(4), &[0, 1, 1, 2]).unwrap();
        let r = p.restrict(&[PointId(3), PointId(1)]).unwrap();
        assert_eq!(r.ids(), &[PointId(3), PointId(1)]);
        assert_eq!(r.nclusters(), 2);

        let err = p.restrict(&[PointId(9)]).unwrap_err();
        assert!(matches!(err, StabilityError::Comparison(_)));
    }
}
