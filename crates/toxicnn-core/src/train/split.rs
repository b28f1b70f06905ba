//! Train/validation split over example indices.

use oorandom::Rand32;

use crate::rng;

/// Indices of the examples used for fitting and for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSplit {
    /// Indices the optimizer sees.
    pub train: Vec<usize>,
    /// Held-out indices.
    pub validation: Vec<usize>,
}

impl ValidationSplit {
    /// Shuffle `0..n` and hold out the tail `fraction` of it.
    ///
    /// The training part keeps `floor(n * (1 - fraction))` indices, so a
    /// non-zero fraction never produces an empty training set unless `n` is
    /// tiny.
    pub fn new(n: usize, fraction: f64, rng: &mut Rand32) -> Self {
        let mut indices: Vec<usize> = (0..n).collect();
        rng::shuffle(&mut indices, rng);

        let split_at = ((n as f64) * (1.0 - fraction)).floor() as usize;
        let split_at = split_at.min(n);
        let validation = indices.split_off(split_at);

        tracing::debug!(
            train = indices.len(),
            validation = validation.len(),
            "split training examples"
        );

        Self {
            train: indices,
            validation,
        }
    }

    /// Returns `true` if there is at least one held-out example.
    #[must_use]
    pub fn has_validation(&self) -> bool {
        !self.validation.is_empty()
    }
}
