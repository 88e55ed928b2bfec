//! # cluster-stability
//!
//! Stability analysis of hierarchical clusterings of sampled points.
//!
//! Given sample points in a parameter space, each carrying a feature vector
//! (typically a binned distribution), this crate asks: if only a random
//! fraction of the points were available, how consistent would their
//! clustering be with the clustering of the full sample? It provides:
//! - Pluggable dissimilarities and condensed distance matrices
//! - Agglomerative hierarchical clustering (average, complete, single
//!   linkage) cut at a cophenetic distance threshold
//! - Figures of merit comparing two clusterings (adjusted Rand index,
//!   Rand index)
//! - A seeded, parallel subsample stability tester and summary statistics
//!
//! Choosing the threshold is left to the caller, typically by sweeping
//! `max_d` and running the tester for each value.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cluster_stability::{HierarchicalClusterer, Linkage, SampleStore, SubsampleStabilityTester};
//!
//! let store = SampleStore::from_rows(coordinates, histograms)?;
//! let clusterer = HierarchicalClusterer::new(0.5).linkage(Linkage::Average);
//!
//! let table = SubsampleStabilityTester::new()
//!     .fraction(0.9)
//!     .repeat(50)
//!     .random_seed(1)
//!     .run(&store, &clusterer)?;
//!
//! println!("{}", cluster_stability::output::format_summary(&table));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod error;
mod result;
mod thread_pool;
mod types;

// Functional modules
pub mod cluster;
pub mod compare;
pub mod data;
pub mod distance;
pub mod output;
pub mod stability;
pub mod statistics;

// Re-exports for public API
pub use cluster::{Dendrogram, HierarchicalClusterer, Linkage, Merge, Partition};
pub use compare::{compare, compare_all, AdjustedRandIndex, Comparison, FigureOfMerit, RandIndex, ScoreSet};
pub use config::{ClusterConfig, StabilityConfig};
pub use data::SampleStore;
pub use distance::{Chi2, DistanceMatrix, Dissimilarity, Euclidean, Manhattan, SquaredEuclidean};
pub use error::{Result, StabilityError};
pub use result::{ResultTable, RunMetadata, Summary, TrialRecord};
pub use stability::{CancelToken, LogProgress, NoProgress, ProgressReporter, SubsampleStabilityTester};
#[cfg(feature = "progress")]
pub use stability::BarProgress;
pub use types::{PointId, SamplePoint, SquareMatrix};

/// Convenience function: stability of `clusterer` on `store` with the given
/// fraction and number of trials, Euclidean distance and adjusted Rand index.
///
/// # Errors
///
/// See [`SubsampleStabilityTester::run`].
pub fn stability(
    store: &SampleStore,
    clusterer: &HierarchicalClusterer,
    fraction: f64,
    repeat: usize,
) -> Result<ResultTable> {
    SubsampleStabilityTester::new()
        .fraction(fraction)
        .repeat(repeat)
        .run(store, clusterer)
}
