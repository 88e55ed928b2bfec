//! Statistical helpers for stability runs.
//!
//! - Online mean/variance accumulation (Welford)
//! - Counter-based seed derivation for per-trial RNGs

mod seed;
mod welford;

pub use seed::{counter_rng_seed, trial_rng};
pub use welford::Welford;
