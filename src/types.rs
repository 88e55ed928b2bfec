//! Type aliases and common types.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Dense square matrix of pairwise distances.
pub type SquareMatrix = DMatrix<f64>;

/// Identifier of a sample point, stable across subsets of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PointId(pub u64);

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A sampled point in parameter space together with its feature vector.
///
/// The coordinate locates the point in parameter space; the features (for
/// example the bins of a distribution) are the only input to distance
/// computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    id: PointId,
    coordinate: Vec<f64>,
    features: Vec<f64>,
}

impl SamplePoint {
    /// Create a new sample point.
    pub fn new(id: PointId, coordinate: Vec<f64>, features: Vec<f64>) -> Self {
        Self {
            id,
            coordinate,
            features,
        }
    }

    /// Identifier of this point.
    pub fn id(&self) -> PointId {
        self.id
    }

    /// Coordinate in parameter space.
    pub fn coordinate(&self) -> &[f64] {
        &self.coordinate
    }

    /// Feature vector used for distance computation.
    pub fn features(&self) -> &[f64] {
        &self.features
    }

    /// Sum of all feature entries (the norm of a binned distribution).
    pub fn norm(&self) -> f64 {
        self.features.iter().sum()
    }

    pub(crate) fn with_features(&self, features: Vec<f64>) -> Self {
        Self {
            id: self.id,
            coordinate: self.coordinate.clone(),
            features,
        }
    }
}
