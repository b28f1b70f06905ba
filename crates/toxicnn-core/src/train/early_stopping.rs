//! Validation-loss early stopping.

/// Stops training once the monitored loss has failed to improve by at least
/// `min_delta` for `patience` consecutive epochs.
///
/// ```rust
/// use toxicnn_core::train::EarlyStopping;
///
/// let mut stopper = EarlyStopping::new(2, 0.01);
/// assert!(!stopper.update(0.5));
/// assert!(!stopper.update(0.499));
/// assert!(stopper.update(0.498));
/// ```
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    min_delta: f64,
    best: f64,
    wait: usize,
}

impl EarlyStopping {
    /// Create a stopper with no loss seen yet.
    pub fn new(patience: usize, min_delta: f64) -> Self {
        Self {
            patience,
            min_delta,
            best: f64::INFINITY,
            wait: 0,
        }
    }

    /// Record one epoch's loss and return `true` if training should stop.
    ///
    /// An epoch improves when `best - loss >= min_delta`; the first finite
    /// loss always improves.
    pub fn update(&mut self, loss: f64) -> bool {
        if self.best - loss >= self.min_delta {
            self.best = loss;
            self.wait = 0;
        } else {
            self.wait += 1;
        }
        self.wait >= self.patience
    }

    /// Lowest loss that counted as an improvement.
    #[must_use]
    pub fn best(&self) -> f64 {
        self.best
    }

    /// Consecutive epochs without improvement.
    #[must_use]
    pub fn wait(&self) -> usize {
        self.wait
    }

    /// Forget every recorded loss.
    pub fn reset(&mut self) {
        self.best = f64::INFINITY;
        self.wait = 0;
    }
}
