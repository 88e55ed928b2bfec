//! Dissimilarities between feature vectors and the distance matrices built
//! from them.
//!
//! A [`Dissimilarity`] must be symmetric and non-negative. This is a
//! documented precondition and is not re-checked per pair; non-finite results
//! are caught when the matrix reaches the clusterer.

mod matrix;

pub use matrix::DistanceMatrix;

/// Pairwise dissimilarity between two feature vectors of equal length.
pub trait Dissimilarity: Send + Sync {
    /// Distance between `a` and `b`.
    fn distance(&self, a: &[f64], b: &[f64]) -> f64;

    /// Short name recorded in result metadata.
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> Dissimilarity for F
where
    F: Fn(&[f64], &[f64]) -> f64 + Send + Sync,
{
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        self(a, b)
    }
}

/// Euclidean (L2) distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl Dissimilarity for Euclidean {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        SquaredEuclidean.distance(a, b).sqrt()
    }

    fn name(&self) -> &str {
        "euclidean"
    }
}

/// Sum of squared differences.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclidean;

impl Dissimilarity for SquaredEuclidean {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }

    fn name(&self) -> &str {
        "sqeuclidean"
    }
}

/// Sum of absolute differences (L1).
#[derive(Debug, Clone, Copy, Default)]
pub struct Manhattan;

impl Dissimilarity for Manhattan {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
    }

    fn name(&self) -> &str {
        "manhattan"
    }
}

/// Chi-squared per degree of freedom between two binned distributions.
///
/// Bin contents are treated as Poisson counts, so the variance of a bin
/// difference is the sum of the two contents:
///
/// ```text
/// χ²/ndf = 1/nbins · Σ_i (a_i − b_i)² / (a_i + b_i)
/// ```
///
/// Bins empty in both histograms contribute nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chi2;

impl Dissimilarity for Chi2 {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let nbins = a.len().min(b.len());
        if nbins == 0 {
            return 0.0;
        }
        let sum: f64 = a
            .iter()
            .zip(b)
            .map(|(x, y)| {
                let variance = x + y;
                if variance == 0.0 {
                    0.0
                } else {
                    (x - y) * (x - y) / variance
                }
            })
            .sum();
        sum / nbins as f64
    }

    fn name(&self) -> &str {
        "chi2"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean() {
        assert!((Euclidean.distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-12);
        assert_eq!(SquaredEuclidean.distance(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(Manhattan.distance(&[1.0, -1.0], &[0.0, 2.0]), 4.0);
    }

    #[test]
    fn test_chi2_identical_is_zero() {
        let h = [10.0, 20.0, 0.0, 5.0];
        assert_eq!(Chi2.distance(&h, &h), 0.0);
    }

    #[test]
    fn test_chi2_value() {
        // (10-20)^2/30 + (5-5)^2/10 = 100/30, two bins
        let d = Chi2.distance(&[10.0, 5.0], &[20.0, 5.0]);
        assert!((d - 100.0 / 30.0 / 2.0).abs() < 1e-12);
        assert_eq!(Chi2.distance(&[10.0, 5.0], &[20.0, 5.0]), Chi2.distance(&[20.0, 5.0], &[10.0, 5.0]));
    }

    #[test]
    fn test_closure_metric() {
        let max_abs = |a: &[f64], b: &[f64]| {
            a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
        };
        assert_eq!(max_abs.distance(&[0.0, 5.0], &[1.0, 2.0]), 3.0);
        assert_eq!(Dissimilarity::name(&max_abs), "custom");
    }
}
