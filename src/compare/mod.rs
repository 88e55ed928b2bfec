//! Comparison of a trial clustering against the reference clustering.
//!
//! The reference partition covers the full sample; a trial partition covers
//! a subsample. The reference is restricted to the trial's points before a
//! [`FigureOfMerit`] scores the agreement.

mod rand_index;

pub use rand_index::{AdjustedRandIndex, PairCounts, RandIndex};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cluster::Partition;
use crate::error::{Result, StabilityError};

/// Similarity score between two partitions of the same points.
pub trait FigureOfMerit: Send + Sync {
    /// Short name recorded in result metadata.
    fn name(&self) -> &str;

    /// Inclusive range of attainable scores.
    fn bounds(&self) -> (f64, f64);

    /// Score the agreement of `trial` with `reference`.
    ///
    /// Both partitions must label the same points in the same order.
    fn score(&self, reference: &Partition, trial: &Partition) -> Result<f64>;
}

/// Outcome of comparing one trial against the reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Figure of merit.
    pub fom: f64,
    /// Number of clusters in the trial partition.
    pub nclusters: usize,
}

/// Scores of one trial under several figures of merit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    /// Score per figure-of-merit name.
    pub scores: BTreeMap<String, f64>,
    /// Number of clusters in the trial partition.
    pub nclusters: usize,
}

/// Compare `trial` against `reference` restricted to the trial's points.
///
/// # Errors
///
/// Returns `Comparison` if either partition is empty or the trial contains
/// points the reference does not label.
pub fn compare(reference: &Partition, trial: &Partition, fom: &dyn FigureOfMerit) -> Result<Comparison> {
    let restricted = restrict_reference(reference, trial)?;
    Ok(Comparison {
        fom: fom.score(&restricted, trial)?,
        nclusters: trial.nclusters(),
    })
}

/// Like [`compare`], scoring the trial with every figure in `foms`.
///
/// The reference is restricted once. A later figure with the same name as an
/// earlier one overwrites its score.
pub fn compare_all(reference: &Partition, trial: &Partition, foms: &[&dyn FigureOfMerit]) -> Result<ScoreSet> {
    let restricted = restrict_reference(reference, trial)?;
    let scores = foms
        .iter()
        .map(|fom| -> Result<(String, f64)> { Ok((fom.name().to_string(), fom.score(&restricted, trial)?)) })
        .collect::<Result<BTreeMap<_, _>>>()?;
    Ok(ScoreSet {
        scores,
        nclusters: trial.nclusters(),
    })
}

fn restrict_reference(reference: &Partition, trial: &Partition) -> Result<Partition> {
    if reference.is_empty() {
        return Err(StabilityError::comparison("reference partition has no points"));
    }
    if trial.is_empty() {
        return Err(StabilityError::comparison("trial partition has no points"));
    }
    reference.restrict(trial.ids())
}
