//! Result types of a stability run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cluster::Linkage;
use crate::error::{Result, StabilityError};
use crate::statistics::Welford;

/// One stability trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Trial index within the run (0-based).
    pub trial: usize,
    /// Fraction of the store drawn for this trial.
    pub fraction: f64,
    /// Number of points drawn.
    pub subsample_size: usize,
    /// Primary figure of merit against the reference clustering.
    pub fom: f64,
    /// Every configured figure of merit by name, the primary one included.
    #[serde(default)]
    pub foms: BTreeMap<String, f64>,
    /// Number of clusters found in the subsample.
    pub nclusters: usize,
}

/// Configuration and context a result table was produced with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Number of points in the sample store.
    pub store_size: usize,
    /// Points drawn per trial.
    pub subsample_size: usize,
    /// Fraction drawn per trial.
    pub fraction: f64,
    /// Requested number of trials.
    pub repeat: usize,
    /// Base seed of the run (drawn at random when none was configured).
    pub seed: u64,
    /// Whether `seed` was configured by the caller.
    pub seeded: bool,
    /// Clustering threshold.
    pub max_d: f64,
    /// Clustering linkage.
    pub linkage: Linkage,
    /// Name of the dissimilarity.
    pub metric: String,
    /// Name of the primary figure of merit.
    pub fom: String,
    /// Names of all figures of merit scored per trial.
    #[serde(default)]
    pub foms: Vec<String>,
    /// Attainable range of the primary figure of merit.
    pub fom_bounds: (f64, f64),
    /// Clusters in the full-sample reference clustering.
    pub reference_nclusters: usize,
    /// Wall-clock time of the run in seconds.
    pub runtime_secs: f64,
}

/// Descriptive statistics over all trials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of trials.
    pub n: usize,
    /// Mean figure of merit.
    pub fom_mean: f64,
    /// Sample standard deviation of the figure of merit.
    pub fom_std: f64,
    /// Smallest figure of merit.
    pub fom_min: f64,
    /// Largest figure of merit.
    pub fom_max: f64,
    /// Mean cluster count.
    pub nclusters_mean: f64,
    /// Sample standard deviation of the cluster count.
    pub nclusters_std: f64,
}

/// Ordered trial records of one run, owned by the caller.
///
/// Records are ordered by trial index, independent of which thread finished
/// first. Statistics are computed on demand and never modify the records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    records: Vec<TrialRecord>,
    metadata: RunMetadata,
}

impl ResultTable {
    pub(crate) fn new(records: Vec<TrialRecord>, metadata: RunMetadata) -> Self {
        Self { records, metadata }
    }

    /// Raw records in trial order.
    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    /// Run configuration and context.
    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    /// Number of trials.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no trials.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Primary figure-of-merit column.
    pub fn fom_values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.fom).collect()
    }

    /// Column of the figure of merit called `name`, `None` if it was not
    /// scored.
    pub fn fom_column(&self, name: &str) -> Option<Vec<f64>> {
        if !self.metadata.foms.iter().any(|f| f == name) {
            return None;
        }
        self.records.iter().map(|r| r.foms.get(name).copied()).collect()
    }

    /// Mean and sample standard deviation of the figure of merit `name`.
    ///
    /// # Errors
    ///
    /// `EmptyResult` when the table holds no trials, `Comparison` when no
    /// figure of merit of that name was scored.
    pub fn fom_stats(&self, name: &str) -> Result<(f64, f64)> {
        if self.records.is_empty() {
            return Err(StabilityError::EmptyResult);
        }
        let column = self
            .fom_column(name)
            .ok_or_else(|| StabilityError::comparison(format!("no figure of merit named '{}'", name)))?;
        let acc: Welford = column.into_iter().collect();
        Ok((acc.mean().unwrap_or(f64::NAN), acc.std_dev().unwrap_or(f64::NAN)))
    }

    /// Cluster-count column.
    pub fn nclusters_values(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.nclusters).collect()
    }

    /// Mean figure of merit.
    pub fn mean_fom(&self) -> Result<f64> {
        Ok(self.summary()?.fom_mean)
    }

    /// Sample standard deviation of the figure of merit.
    pub fn std_fom(&self) -> Result<f64> {
        Ok(self.summary()?.fom_std)
    }

    /// Mean cluster count.
    pub fn mean_nclusters(&self) -> Result<f64> {
        Ok(self.summary()?.nclusters_mean)
    }

    /// Sample standard deviation of the cluster count.
    pub fn std_nclusters(&self) -> Result<f64> {
        Ok(self.summary()?.nclusters_std)
    }

    /// All descriptive statistics at once.
    ///
    /// # Errors
    ///
    /// Returns `EmptyResult` when the table holds no trials.
    pub fn summary(&self) -> Result<Summary> {
        if self.records.is_empty() {
            return Err(StabilityError::EmptyResult);
        }
        let fom: Welford = self.records.iter().map(|r| r.fom).collect();
        let nclusters: Welford = self.records.iter().map(|r| r.nclusters as f64).collect();
        let (fom_min, fom_max) = self
            .records
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| (lo.min(r.fom), hi.max(r.fom)));

        Ok(Summary {
            n: self.records.len(),
            fom_mean: fom.mean().unwrap_or(f64::NAN),
            fom_std: fom.std_dev().unwrap_or(f64::NAN),
            fom_min,
            fom_max,
            nclusters_mean: nclusters.mean().unwrap_or(f64::NAN),
            nclusters_std: nclusters.std_dev().unwrap_or(f64::NAN),
        })
    }

    /// Number of trials per observed cluster count.
    pub fn nclusters_histogram(&self) -> BTreeMap<usize, usize> {
        let mut histogram = BTreeMap::new();
        for record in &self.records {
            *histogram.entry(record.nclusters).or_insert(0) += 1;
        }
        histogram
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_metadata(repeat: usize) -> RunMetadata {
        RunMetadata {
            store_size: 100,
            subsample_size: 90,
            fraction: 0.9,
            repeat,
            seed: 42,
            seeded: true,
            max_d: 2.0,
            linkage: Linkage::Average,
            metric: "euclidean".to_string(),
            fom: "ari".to_string(),
            foms: vec!["ari".to_string()],
            fom_bounds: (-1.0, 1.0),
            reference_nclusters: 2,
            runtime_secs: 0.25,
        }
    }

    pub(crate) fn make_table(rows: &[(f64, usize)]) -> ResultTable {
        let records = rows
            .iter()
            .enumerate()
            .map(|(trial, &(fom, nclusters))| TrialRecord {
                trial,
                fraction: 0.9,
                subsample_size: 90,
                fom,
                foms: BTreeMap::from([("ari".to_string(), fom)]),
                nclusters,
            })
            .collect();
        ResultTable::new(records, make_metadata(rows.len()))
    }

    #[test]
    fn test_summary() {
        let table = make_table(&[(1.0, 2), (0.5, 3), (0.0, 2), (0.5, 1)]);
        let summary = table.summary().unwrap();
        assert_eq!(summary.n, 4);
        assert!((summary.fom_mean - 0.5).abs() < 1e-12);
        // deviations 0.5, 0, -0.5, 0 -> 0.5 / 3
        assert!((summary.fom_std - (0.5f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(summary.fom_min, 0.0);
        assert_eq!(summary.fom_max, 1.0);
        assert!((summary.nclusters_mean - 2.0).abs() < 1e-12);
        assert_eq!(table.mean_fom().unwrap(), summary.fom_mean);
    }

    #[test]
    fn test_empty_table_statistics_fail() {
        let table = make_table(&[]);
        assert!(table.is_empty());
        assert!(matches!(table.summary(), Err(StabilityError::EmptyResult)));
        assert!(matches!(table.mean_fom(), Err(StabilityError::EmptyResult)));
        assert!(matches!(table.std_nclusters(), Err(StabilityError::EmptyResult)));
        assert!(table.nclusters_histogram().is_empty());
    }

    #[test]
    fn test_columns_and_histogram() {
        let table = make_table(&[(1.0, 2), (0.8, 2), (0.3, 4)]);
        assert_eq!(table.fom_values(), vec![1.0, 0.8, 0.3]);
        assert_eq!(table.nclusters_values(), vec![2, 2, 4]);
        let histogram = table.nclusters_histogram();
        assert_eq!(histogram.get(&2), Some(&2));
        assert_eq!(histogram.get(&4), Some(&1));
        assert_eq!(table.records()[2].trial, 2);
    }

    #[test]
    fn test_named_fom_columns() {
        let table = make_table(&[(1.0, 2), (0.5, 2)]);
        assert_eq!(table.fom_column("ari"), Some(vec![1.0, 0.5]));
        assert_eq!(table.fom_column("rand"), None);

        let (mean, std) = table.fom_stats("ari").unwrap();
        assert!((mean - 0.75).abs() < 1e-12);
        assert!((std - 0.125f64.sqrt()).abs() < 1e-12);
        assert!(matches!(table.fom_stats("rand"), Err(StabilityError::Comparison(_))));
        assert!(matches!(make_table(&[]).fom_stats("ari"), Err(StabilityError::EmptyResult)));
    }
}
