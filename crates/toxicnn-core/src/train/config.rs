use serde::{Deserialize, Serialize};

use crate::error::{Result, ToxicnnError};

/// Optimisation, validation and early-stopping settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Examples per gradient step.
    pub batch_size: usize,
    /// Maximum number of epochs.
    pub epochs: usize,
    /// Fraction of the training examples held out for validation.
    pub validation_split: f64,
    /// Consecutive non-improving epochs tolerated before stopping.
    pub patience: usize,
    /// Smallest validation-loss decrease that counts as an improvement.
    pub min_delta: f64,
    /// Adam step size.
    pub learning_rate: f64,
    /// First-moment decay.
    pub beta1: f64,
    /// Second-moment decay.
    pub beta2: f64,
    /// Numerical-stability term of the Adam update.
    pub epsilon: f64,
    /// Seed for initialisation, splitting, shuffling and dropout.
    pub seed: u64,
    /// Reshuffle the batch order every epoch.
    pub shuffle: bool,
    /// Draw a new validation split every epoch instead of reusing the first.
    pub reshuffle_split: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            batch_size: 256,
            epochs: 8,
            validation_split: 0.1,
            patience: 4,
            min_delta: 0.01,
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            seed: 0,
            shuffle: true,
            reshuffle_split: false,
        }
    }
}

impl TrainConfig {
    /// Create a training configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the epoch cap.
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the held-out fraction.
    pub fn with_validation_split(mut self, fraction: f64) -> Self {
        self.validation_split = fraction;
        self
    }

    /// Set the early-stopping patience and minimum delta.
    pub fn with_early_stopping(mut self, patience: usize, min_delta: f64) -> Self {
        self.patience = patience;
        self.min_delta = min_delta;
        self
    }

    /// Set the learning rate.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable per-epoch batch shuffling.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Enable or disable drawing a fresh validation split every epoch.
    pub fn with_reshuffle_split(mut self, reshuffle: bool) -> Self {
        self.reshuffle_split = reshuffle;
        self
    }

    /// Check every value is usable.
    ///
    /// # Errors
    ///
    /// Returns `ToxicnnError::InvalidConfig` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(ToxicnnError::InvalidConfig(msg));
        if self.batch_size == 0 {
            return fail("batch_size must be positive".into());
        }
        if self.epochs == 0 {
            return fail("epochs must be positive".into());
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return fail(format!(
                "validation_split must be in [0, 1), got {}",
                self.validation_split
            ));
        }
        if self.min_delta < 0.0 || !self.min_delta.is_finite() {
            return fail(format!("min_delta must be >= 0, got {}", self.min_delta));
        }
        if self.learning_rate <= 0.0 || !self.learning_rate.is_finite() {
            return fail(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return fail(format!("{name} must be in [0, 1), got {beta}"));
            }
        }
        if self.epsilon <= 0.0 {
            return fail(format!("epsilon must be positive, got {}", self.epsilon));
        }
        Ok(())
    }
}
