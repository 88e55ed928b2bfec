//! Subsample stability tester: repeated clustering of random subsamples.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::seq::index;
use tracing::{debug, info, warn};

use crate::cluster::{HierarchicalClusterer, Partition};
use crate::compare::{compare_all, AdjustedRandIndex, FigureOfMerit};
use crate::config::StabilityConfig;
use crate::data::SampleStore;
use crate::distance::{DistanceMatrix, Dissimilarity, Euclidean};
use crate::error::{Result, StabilityError};
use crate::result::{ResultTable, RunMetadata, TrialRecord};
use crate::statistics::trial_rng;
use crate::thread_pool;

use super::progress::{CancelToken, NoProgress, ProgressReporter};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Measures how consistently a clustering survives random subsampling.
///
/// A run clusters the full store once (the reference), then repeatedly draws
/// ⌈fraction·N⌉ points without replacement, clusters only those, and scores
/// the result against the reference restricted to the drawn points.
///
/// # Example
///
/// ```ignore
/// use cluster_stability::{HierarchicalClusterer, SubsampleStabilityTester};
///
/// let table = SubsampleStabilityTester::new()
///     .fraction(0.8)
///     .repeat(100)
///     .random_seed(42)
///     .run(&store, &HierarchicalClusterer::new(0.5))?;
///
/// println!("mean fom: {:.3}", table.mean_fom()?);
/// ```
///
/// Besides the primary figure of merit, further figures can be added with
/// [`add_fom`](Self::add_fom); every trial is scored with all of them.
///
/// Trials are independent: each draws from its own RNG derived from the run
/// seed and the trial index, and they share only the read-only store and
/// reference partition. With the `parallel` feature they run on a thread
/// pool; records are always returned in trial order.
#[derive(Clone)]
pub struct SubsampleStabilityTester {
    config: StabilityConfig,
    metric: Arc<dyn Dissimilarity>,
    fom: Arc<dyn FigureOfMerit>,
    extra_foms: BTreeMap<String, Arc<dyn FigureOfMerit>>,
    progress: Option<Arc<dyn ProgressReporter>>,
    cancel: Option<CancelToken>,
}

impl Default for SubsampleStabilityTester {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SubsampleStabilityTester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubsampleStabilityTester")
            .field("config", &self.config)
            .field("metric", &self.metric.name())
            .field("fom", &self.fom.name())
            .field("extra_foms", &self.extra_foms.keys().collect::<Vec<_>>())
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl SubsampleStabilityTester {
    /// Create with default configuration: fraction 0.9, 10 trials,
    /// Euclidean distance, adjusted Rand index.
    pub fn new() -> Self {
        Self::from_config(StabilityConfig::default())
    }

    /// Create from an explicit configuration.
    pub fn from_config(config: StabilityConfig) -> Self {
        Self {
            config,
            metric: Arc::new(Euclidean),
            fom: Arc::new(AdjustedRandIndex),
            extra_foms: BTreeMap::new(),
            progress: None,
            cancel: None,
        }
    }

    /// Few trials, for exploration and tests.
    pub fn quick() -> Self {
        Self::from_config(StabilityConfig {
            repeat: 10,
            ..StabilityConfig::default()
        })
    }

    /// Many trials, for summary statistics worth reporting.
    pub fn thorough() -> Self {
        Self::from_config(StabilityConfig {
            repeat: 200,
            ..StabilityConfig::default()
        })
    }

    /// Set the fraction of points drawn per trial, in (0, 1].
    pub fn fraction(mut self, fraction: f64) -> Self {
        self.config.fraction = fraction;
        self
    }

    /// Set the number of trials.
    pub fn repeat(mut self, repeat: usize) -> Self {
        self.config.repeat = repeat;
        self
    }

    /// Fix the base seed so runs reproduce exactly.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = Some(seed);
        self
    }

    /// Log progress when no reporter is injected.
    pub fn show_progress(mut self, show: bool) -> Self {
        self.config.show_progress = show;
        self
    }

    /// Set the dissimilarity between feature vectors.
    pub fn metric(mut self, metric: impl Dissimilarity + 'static) -> Self {
        self.metric = Arc::new(metric);
        self
    }

    /// Set the primary figure of merit, reported as each record's `fom`.
    pub fn fom(mut self, fom: impl FigureOfMerit + 'static) -> Self {
        self.extra_foms.remove(fom.name());
        self.fom = Arc::new(fom);
        self
    }

    /// Score every trial with an additional figure of merit, keyed by its
    /// name. A figure with the name of one already configured replaces it.
    pub fn add_fom(mut self, fom: impl FigureOfMerit + 'static) -> Self {
        let name = fom.name().to_string();
        if name == self.fom.name() {
            warn!(fom = %name, "replacing figure of merit");
            self.fom = Arc::new(fom);
            return self;
        }
        if self.extra_foms.insert(name.clone(), Arc::new(fom)).is_some() {
            warn!(fom = %name, "replacing figure of merit");
        }
        self
    }

    /// Names of all configured figures of merit, the primary one first.
    pub fn fom_names(&self) -> Vec<String> {
        std::iter::once(self.fom.name().to_string())
            .chain(self.extra_foms.keys().cloned())
            .collect()
    }

    /// Inject a progress reporter. Takes precedence over `show_progress`.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress = Some(reporter);
        self
    }

    /// Attach a token that can abandon the run from another thread.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The current configuration.
    pub fn config(&self) -> &StabilityConfig {
        &self.config
    }

    /// Cluster the full store with the tester's metric.
    pub fn reference(&self, store: &SampleStore, clusterer: &HierarchicalClusterer) -> Result<Partition> {
        let matrix = DistanceMatrix::full(store, self.metric.as_ref())?;
        clusterer.cluster(&matrix)
    }

    /// Run the stability experiment.
    ///
    /// # Errors
    ///
    /// Configuration errors, `InsufficientData` when the store or the
    /// subsample has fewer than two points, any error of an individual trial
    /// (the whole run fails, no partial table is returned), and `Cancelled`.
    pub fn run(&self, store: &SampleStore, clusterer: &HierarchicalClusterer) -> Result<ResultTable> {
        self.config.validate()?;
        clusterer.config().validate()?;

        let reference = self.reference(store, clusterer)?;
        info!(
            points = store.len(),
            nclusters = reference.nclusters(),
            "reference clustering resulted in {} clusters",
            reference.nclusters()
        );
        self.run_with_reference(store, clusterer, &reference)
    }

    /// Run the trials against an already computed reference partition.
    ///
    /// The reference must label every point of `store`; otherwise the run
    /// fails with `Comparison` before any trial.
    pub fn run_with_reference(
        &self,
        store: &SampleStore,
        clusterer: &HierarchicalClusterer,
        reference: &Partition,
    ) -> Result<ResultTable> {
        let start_time = Instant::now();
        self.config.validate()?;
        clusterer.config().validate()?;

        let covered: HashSet<_> = reference.ids().iter().copied().collect();
        if let Some(missing) = store.ids().into_iter().find(|id| !covered.contains(id)) {
            return Err(StabilityError::comparison(format!(
                "point {} missing from reference partition",
                missing
            )));
        }

        let n = store.len();
        let subsample_size = self.config.subsample_size(n);
        if subsample_size < 2 {
            return Err(StabilityError::InsufficientData {
                required: 2,
                actual: subsample_size,
            });
        }

        let repeat = self.config.repeat;
        let seed = self.config.random_seed.unwrap_or_else(rand::random);
        let reporter = self.reporter();
        info!(
            fraction = self.config.fraction,
            repeat,
            subsample_size,
            seed,
            metric = self.metric.name(),
            fom = self.fom.name(),
            "starting subsample stability run"
        );

        if self.is_cancelled() {
            return Err(StabilityError::Cancelled {
                completed: 0,
                total: repeat,
            });
        }

        reporter.start(repeat);
        let completed = AtomicUsize::new(0);
        let run_trial = |trial: usize| -> Result<TrialRecord> {
            if self.is_cancelled() {
                return Err(StabilityError::Cancelled {
                    completed: completed.load(Ordering::SeqCst),
                    total: repeat,
                });
            }
            let record = self.trial(store, clusterer, reference, seed, trial, subsample_size)?;
            completed.fetch_add(1, Ordering::SeqCst);
            reporter.advance();
            Ok(record)
        };

        #[cfg(feature = "parallel")]
        let records: Result<Vec<TrialRecord>> =
            thread_pool::install(|| (0..repeat).into_par_iter().map(run_trial).collect());

        #[cfg(not(feature = "parallel"))]
        let records: Result<Vec<TrialRecord>> = thread_pool::install(|| (0..repeat).map(run_trial).collect());

        reporter.finish();
        let records = records?;

        let metadata = RunMetadata {
            store_size: n,
            subsample_size,
            fraction: self.config.fraction,
            repeat,
            seed,
            seeded: self.config.random_seed.is_some(),
            max_d: clusterer.threshold(),
            linkage: clusterer.linkage_rule(),
            metric: self.metric.name().to_string(),
            fom: self.fom.name().to_string(),
            foms: self.fom_names(),
            fom_bounds: self.fom.bounds(),
            reference_nclusters: reference.nclusters(),
            runtime_secs: start_time.elapsed().as_secs_f64(),
        };
        let table = ResultTable::new(records, metadata);

        if let Ok(summary) = table.summary() {
            info!(
                trials = summary.n,
                fom_mean = summary.fom_mean,
                fom_std = summary.fom_std,
                nclusters_mean = summary.nclusters_mean,
                runtime_secs = table.metadata().runtime_secs,
                "subsample stability run finished"
            );
        }
        Ok(table)
    }

    /// One trial: draw, cluster, compare.
    fn trial(
        &self,
        store: &SampleStore,
        clusterer: &HierarchicalClusterer,
        reference: &Partition,
        seed: u64,
        trial: usize,
        subsample_size: usize,
    ) -> Result<TrialRecord> {
        let mut rng = trial_rng(seed, trial);
        let mut indices = index::sample(&mut rng, store.len(), subsample_size).into_vec();
        indices.sort_unstable();

        let matrix = DistanceMatrix::build(store, &indices, self.metric.as_ref())?;
        let partition = clusterer.cluster(&matrix)?;
        let foms: Vec<&dyn FigureOfMerit> = std::iter::once(self.fom.as_ref())
            .chain(self.extra_foms.values().map(|f| f.as_ref()))
            .collect();
        let scores = compare_all(reference, &partition, &foms)?;
        let fom = scores.scores.get(self.fom.name()).copied().ok_or_else(|| {
            StabilityError::comparison(format!("no score for figure of merit '{}'", self.fom.name()))
        })?;

        debug!(trial, fom, nclusters = scores.nclusters, "trial finished");
        Ok(TrialRecord {
            trial,
            fraction: self.config.fraction,
            subsample_size,
            fom,
            foms: scores.scores,
            nclusters: scores.nclusters,
        })
    }

    fn reporter(&self) -> Arc<dyn ProgressReporter> {
        match &self.progress {
            Some(reporter) => Arc::clone(reporter),
            None if self.config.show_progress => default_reporter(),
            None => Arc::new(NoProgress),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

#[cfg(feature = "progress")]
fn default_reporter() -> Arc<dyn ProgressReporter> {
    Arc::new(super::progress::BarProgress::new())
}

#[cfg(not(feature = "progress"))]
fn default_reporter() -> Arc<dyn ProgressReporter> {
    Arc::new(super::progress::LogProgress::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PointId;

    /// Two tight groups of `per_group` points on a line, ten units apart.
    fn two_groups(per_group: usize) -> SampleStore {
        let features: Vec<Vec<f64>> = (0..2 * per_group)
            .map(|i| {
                let offset = if i < per_group { 0.0 } else { 10.0 };
                vec![offset + (i % per_group) as f64 * 0.01]
            })
            .collect();
        SampleStore::from_rows(vec![vec![]; features.len()], features).unwrap()
    }

    #[test]
    fn test_seeded_run_reproduces() {
        let store = two_groups(20);
        let clusterer = HierarchicalClusterer::new(1.0);
        let tester = SubsampleStabilityTester::new().fraction(0.5).repeat(15).random_seed(9);

        let a = tester.run(&store, &clusterer).unwrap();
        let b = tester.run(&store, &clusterer).unwrap();
        assert_eq!(a.records(), b.records());
        assert_eq!(a.metadata().seed, 9);
        assert!(a.metadata().seeded);
    }

    #[test]
    fn test_records_in_trial_order() {
        let store = two_groups(10);
        let table = SubsampleStabilityTester::new()
            .repeat(25)
            .random_seed(1)
            .run(&store, &HierarchicalClusterer::new(1.0))
            .unwrap();
        let trials: Vec<usize> = table.records().iter().map(|r| r.trial).collect();
        assert_eq!(trials, (0..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_subsample_of_one_fails() {
        let store = two_groups(5);
        let err = SubsampleStabilityTester::new()
            .fraction(0.1)
            .run(&store, &HierarchicalClusterer::new(1.0))
            .unwrap_err();
        assert!(matches!(err, StabilityError::InsufficientData { actual: 1, .. }));
    }

    #[test]
    fn test_invalid_fraction_fails() {
        let store = two_groups(5);
        let err = SubsampleStabilityTester::new()
            .fraction(1.2)
            .run(&store, &HierarchicalClusterer::new(1.0))
            .unwrap_err();
        assert!(matches!(err, StabilityError::InvalidConfig(_)));
    }

    #[test]
    fn test_zero_repeat_gives_empty_table() {
        let store = two_groups(5);
        let table = SubsampleStabilityTester::new()
            .repeat(0)
            .run(&store, &HierarchicalClusterer::new(1.0))
            .unwrap();
        assert!(table.is_empty());
        assert!(matches!(table.summary(), Err(StabilityError::EmptyResult)));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let err = SubsampleStabilityTester::new()
            .cancel_token(token)
            .run(&two_groups(5), &HierarchicalClusterer::new(1.0))
            .unwrap_err();
        assert!(matches!(err, StabilityError::Cancelled { completed: 0, total: 10 }));
    }

    #[test]
    fn test_reference_must_cover_store() {
        let store = two_groups(5);
        let clusterer = HierarchicalClusterer::new(1.0);
        let partial = Partition::from_labels(vec![PointId(0), PointId(1)], &[0, 0]).unwrap();
        let err = SubsampleStabilityTester::new()
            .random_seed(3)
            .run_with_reference(&store, &clusterer, &partial)
            .unwrap_err();
        assert!(matches!(err, StabilityError::Comparison(_)));
    }

    #[test]
    fn test_partial_reference_rejected_without_trials() {
        let store = two_groups(5);
        let partial = Partition::from_labels((0..9).map(PointId).collect(), &[0; 9]).unwrap();
        let err = SubsampleStabilityTester::new()
            .repeat(0)
            .run_with_reference(&store, &HierarchicalClusterer::new(1.0), &partial)
            .unwrap_err();
        assert!(matches!(err, StabilityError::Comparison(_)));
    }

    #[test]
    fn test_added_foms_score_every_trial() {
        use crate::compare::RandIndex;

        let store = two_groups(15);
        let tester = SubsampleStabilityTester::new()
            .fraction(0.4)
            .repeat(20)
            .random_seed(8)
            .add_fom(RandIndex);
        assert_eq!(tester.fom_names(), vec!["ari", "rand"]);

        let table = tester.run(&store, &HierarchicalClusterer::new(1.0)).unwrap();
        assert_eq!(table.metadata().fom, "ari");
        assert_eq!(table.metadata().foms, vec!["ari", "rand"]);
        for record in table.records() {
            assert_eq!(record.foms.len(), 2);
            assert_eq!(record.foms["ari"], record.fom);
            assert!((0.0..=1.0).contains(&record.foms["rand"]));
        }
        assert_eq!(table.fom_column("ari"), Some(table.fom_values()));
    }

    #[test]
    fn test_add_fom_replaces_by_name() {
        use crate::compare::RandIndex;

        let tester = SubsampleStabilityTester::new().add_fom(RandIndex).add_fom(RandIndex);
        assert_eq!(tester.fom_names(), vec!["ari", "rand"]);

        // Making the added figure primary keeps one column per name.
        let tester = tester.fom(RandIndex);
        assert_eq!(tester.fom_names(), vec!["rand"]);
    }

    #[test]
    fn test_progress_reporter_called_per_trial() {
        #[derive(Default)]
        struct Counting {
            started: AtomicUsize,
            advanced: AtomicUsize,
        }
        impl ProgressReporter for Counting {
            fn start(&self, total: usize) {
                self.started.store(total, Ordering::SeqCst);
            }
            fn advance(&self) {
                self.advanced.fetch_add(1, Ordering::SeqCst);
            }
            fn finish(&self) {}
        }

        let counting = Arc::new(Counting::default());
        let store = two_groups(8);
        let with_progress = SubsampleStabilityTester::new()
            .repeat(12)
            .random_seed(5)
            .progress_reporter(counting.clone())
            .run(&store, &HierarchicalClusterer::new(1.0))
            .unwrap();
        let without = SubsampleStabilityTester::new()
            .repeat(12)
            .random_seed(5)
            .run(&store, &HierarchicalClusterer::new(1.0))
            .unwrap();

        assert_eq!(counting.started.load(Ordering::SeqCst), 12);
        assert_eq!(counting.advanced.load(Ordering::SeqCst), 12);
        assert_eq!(with_progress.records(), without.records());
    }
}
