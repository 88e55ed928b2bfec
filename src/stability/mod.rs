//! Subsample stability experiments.
//!
//! A run computes the reference clustering of the full store once, then
//! performs independent trials on random subsamples. See
//! [`SubsampleStabilityTester`].

mod progress;
mod tester;

pub use progress::{CancelToken, LogProgress, NoProgress, ProgressReporter};
#[cfg(feature = "progress")]
pub use progress::BarProgress;
pub use tester::SubsampleStabilityTester;
