//! Pair-counting indices: Rand index and adjusted Rand index.

use std::collections::HashMap;

use crate::cluster::Partition;
use crate::error::{Result, StabilityError};

use super::FigureOfMerit;

/// Pair counts of two partitions over the same points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairCounts {
    /// Pairs grouped together in both partitions.
    pub together_both: u64,
    /// Pairs grouped together in the first partition.
    pub together_first: u64,
    /// Pairs grouped together in the second partition.
    pub together_second: u64,
    /// All pairs, n·(n−1)/2.
    pub total: u64,
}

impl PairCounts {
    /// Count pairs from the contingency table of `first` and `second`.
    ///
    /// # Errors
    ///
    /// Returns `Comparison` if the partitions label different points.
    pub fn new(first: &Partition, second: &Partition) -> Result<Self> {
        if first.ids() != second.ids() {
            return Err(StabilityError::comparison(format!(
                "partitions cover different points ({} vs {})",
                first.len(),
                second.len()
            )));
        }

        let mut contingency: HashMap<(usize, usize), u64> = HashMap::new();
        for (&a, &b) in first.labels().iter().zip(second.labels()) {
            *contingency.entry((a, b)).or_insert(0) += 1;
        }

        let pairs = |count: u64| count * count.saturating_sub(1) / 2;
        Ok(Self {
            together_both: contingency.values().map(|&c| pairs(c)).sum(),
            together_first: first.cluster_sizes().iter().map(|&c| pairs(c as u64)).sum(),
            together_second: second.cluster_sizes().iter().map(|&c| pairs(c as u64)).sum(),
            total: pairs(first.len() as u64),
        })
    }
}

/// Fraction of point pairs on which two partitions agree. Range [0, 1].
#[derive(Debug, Clone, Copy, Default)]
pub struct RandIndex;

impl FigureOfMerit for RandIndex {
    fn name(&self) -> &str {
        "rand"
    }

    fn bounds(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn score(&self, reference: &Partition, trial: &Partition) -> Result<f64> {
        let counts = PairCounts::new(reference, trial)?;
        if counts.total == 0 {
            return Ok(1.0);
        }
        let apart_both = counts.total + counts.together_both - counts.together_first - counts.together_second;
        Ok((counts.together_both + apart_both) as f64 / counts.total as f64)
    }
}

/// Rand index corrected for chance (Hubert & Arabie).
///
/// 1 for identical partitions, around 0 for agreement at chance level,
/// bounded below by -1. When both partitions are all singletons or a single
/// cluster the index is undefined; it is reported as 1 since the partitions
/// are then identical.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdjustedRandIndex;

impl FigureOfMerit for AdjustedRandIndex {
    fn name(&self) -> &str {
        "ari"
    }

    fn bounds(&self) -> (f64, f64) {
        (-1.0, 1.0)
    }

    fn score(&self, reference: &Partition, trial: &Partition) -> Result<f64> {
        let counts = PairCounts::new(reference, trial)?;
        if counts.total == 0 {
            return Ok(1.0);
        }
        let index = counts.together_both as f64;
        let (first, second) = (counts.together_first as f64, counts.together_second as f64);
        let expected = first * second / counts.total as f64;
        let max_index = 0.5 * (first + second);
        let denominator = max_index - expected;
        if denominator == 0.0 {
            return Ok(1.0);
        }
        Ok(((index - expected) / denominator).clamp(-1.0, 1.0))
    }
}
