//! Configuration for clustering and stability runs.

use serde::{Deserialize, Serialize};

use crate::cluster::Linkage;
use crate::error::{Result, StabilityError};

/// Configuration options for `HierarchicalClusterer`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Maximum cophenetic distance at which points share a cluster
    /// (default: 1.0).
    ///
    /// Values at or below zero accept no merge.
    pub max_d: f64,

    /// Linkage rule (default: average).
    pub linkage: Linkage,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_d: 1.0,
            linkage: Linkage::Average,
        }
    }
}

impl ClusterConfig {
    /// Check that the threshold is a number.
    pub fn validate(&self) -> Result<()> {
        if self.max_d.is_nan() {
            return Err(StabilityError::config("max_d must not be NaN"));
        }
        Ok(())
    }
}

/// Configuration options for `SubsampleStabilityTester`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Proportion of points drawn per trial, without replacement
    /// (default: 0.9). Must lie in (0, 1].
    pub fraction: f64,

    /// Number of independent trials (default: 10).
    ///
    /// Zero is accepted and produces an empty result table.
    pub repeat: usize,

    /// Optional deterministic seed for subsample draws.
    pub random_seed: Option<u64>,

    /// Report progress once per completed trial (default: false).
    ///
    /// Purely presentational; never changes results.
    pub show_progress: bool,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            fraction: 0.9,
            repeat: 10,
            random_seed: None,
            show_progress: false,
        }
    }
}

impl StabilityConfig {
    /// Check that the fraction lies in (0, 1].
    pub fn validate(&self) -> Result<()> {
        if !(self.fraction > 0.0 && self.fraction <= 1.0) {
            return Err(StabilityError::config(format!(
                "fraction must lie in (0, 1], got {}",
                self.fraction
            )));
        }
        Ok(())
    }

    /// Number of points drawn per trial from a store of `n` points: ⌈f·n⌉.
    ///
    /// Products within 1e-9 of an integer count as that integer, so that
    /// e.g. `0.07 · 100` draws 7 points rather than 8.
    pub fn subsample_size(&self, n: usize) -> usize {
        let raw = self.fraction * n as f64;
        let rounded = raw.round();
        let size = if (raw - rounded).abs() < 1e-9 {
            rounded
        } else {
            raw.ceil()
        };
        (size.max(0.0) as usize).min(n)
    }
}
