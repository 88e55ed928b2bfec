//! Online mean and variance accumulator.

/// Single-pass mean/variance accumulator using Welford's algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Welford {
    n: usize,
    mean: f64,
    /// Sum of squared deviations: Σ(x - μ)²
    m2: f64,
}

impl Welford {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one observation.
    ///
    /// ```text
    /// δ = x - μₙ₋₁
    /// μₙ = μₙ₋₁ + δ/n
    /// M2ₙ = M2ₙ₋₁ + δ·(x - μₙ)
    /// ```
    pub fn update(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Number of observations.
    pub fn count(&self) -> usize {
        self.n
    }

    /// Mean of the observations, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        (self.n > 0).then_some(self.mean)
    }

    /// Unbiased sample variance M2/(n-1); zero for a single observation,
    /// `None` when empty.
    pub fn variance(&self) -> Option<f64> {
        match self.n {
            0 => None,
            1 => Some(0.0),
            n => Some(self.m2 / (n - 1) as f64),
        }
    }

    /// Sample standard deviation.
    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }
}

impl FromIterator<f64> for Welford {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::new();
        for x in iter {
            acc.update(x);
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let acc = Welford::new();
        assert_eq!(acc.mean(), None);
        assert_eq!(acc.variance(), None);
    }

    #[test]
    fn test_matches_batch_computation() {
        let values: Vec<f64> = (0..100).map(|i| ((i * 7) % 17) as f64 * 0.5).collect();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);

        let acc: Welford = values.iter().copied().collect();
        assert!((acc.mean().unwrap() - mean).abs() < 1e-12);
        assert!((acc.variance().unwrap() - var).abs() < 1e-9);
    }

    #[test]
    fn test_single_observation_has_zero_spread() {
        let acc: Welford = std::iter::once(4.0).collect();
        assert_eq!(acc.mean(), Some(4.0));
        assert_eq!(acc.std_dev(), Some(0.0));
    }
}
