//! Error types for stability analysis.

use thiserror::Error;

/// Errors raised by the clustering and stability pipeline.
///
/// Every error is returned to the immediate caller of the operation that
/// detected it. A failing trial fails the whole run with the trial's error.
#[derive(Error, Debug)]
pub enum StabilityError {
    /// Fewer points than a clustering needs.
    #[error("insufficient data: need at least {required} points, got {actual}")]
    InsufficientData {
        /// Minimum number of points required.
        required: usize,
        /// Number of points actually available.
        actual: usize,
    },

    /// A distance entry is NaN, infinite or negative.
    #[error("invalid distance {value} between points {row} and {col}")]
    InvalidDistance {
        /// Row of the offending entry (position within the matrix).
        row: usize,
        /// Column of the offending entry (position within the matrix).
        col: usize,
        /// The offending value.
        value: f64,
    },

    /// Malformed distance matrix reaching the clusterer.
    #[error("clustering error: {0}")]
    Clustering(String),

    /// Partitions do not cover the same point identifiers.
    #[error("comparison error: {0}")]
    Comparison(String),

    /// Statistics requested on a table without trials.
    #[error("result table is empty")]
    EmptyResult,

    /// Configuration value outside its documented domain.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Sample points violating the store invariants.
    #[error("invalid sample: {0}")]
    InvalidSample(String),

    /// The run was cancelled before all trials completed.
    #[error("run cancelled after {completed} of {total} trials")]
    Cancelled {
        /// Trials finished before cancellation was observed.
        completed: usize,
        /// Trials requested.
        total: usize,
    },

    /// Result serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StabilityError {
    /// Creates a clustering error.
    pub fn clustering(message: impl Into<String>) -> Self {
        StabilityError::Clustering(message.into())
    }

    /// Creates a comparison error.
    pub fn comparison(message: impl Into<String>) -> Self {
        StabilityError::Comparison(message.into())
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        StabilityError::InvalidConfig(message.into())
    }

    /// Creates a sample validation error.
    pub fn sample(message: impl Into<String>) -> Self {
        StabilityError::InvalidSample(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StabilityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failure() {
        let err = StabilityError::InsufficientData {
            required: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 2 points, got 1"
        );

        let err = StabilityError::Cancelled {
            completed: 3,
            total: 10,
        };
        assert!(err.to_string().contains("3 of 10"));
    }

    #[test]
    fn test_constructors() {
        assert!(matches!(
            StabilityError::clustering("x"),
            StabilityError::Clustering(m) if m == "x"
        ));
        assert!(matches!(
            StabilityError::comparison("y"),
            StabilityError::Comparison(_)
        ));
        assert!(matches!(
            StabilityError::config("z"),
            StabilityError::InvalidConfig(_)
        ));
    }
}
