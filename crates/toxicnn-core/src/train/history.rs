use std::fmt;

use serde::{Deserialize, Serialize};

/// Metrics of one finished epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Mean training loss, L2 penalty included.
    pub loss: f64,
    /// Fraction of training label entries predicted correctly at 0.5.
    pub accuracy: f64,
    /// Mean validation loss, `None` without a validation split.
    pub val_loss: Option<f64>,
    /// Validation accuracy, `None` without a validation split.
    pub val_accuracy: Option<f64>,
}

/// Why the training loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// Every configured epoch ran.
    EpochCap,
    /// Validation loss stopped improving.
    EarlyStopped {
        /// Epoch after which training stopped.
        epoch: usize,
    },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EpochCap => write!(f, "epoch cap reached"),
            Self::EarlyStopped { epoch } => write!(f, "early stopped after epoch {epoch}"),
        }
    }
}

/// Per-epoch record of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// One entry per completed epoch, in order.
    pub epochs: Vec<EpochMetrics>,
    /// How the run ended.
    pub stop_reason: StopReason,
}

impl TrainingHistory {
    /// Number of completed epochs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    /// Returns `true` if no epoch completed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Metrics of the last completed epoch.
    #[must_use]
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    /// Epoch with the lowest validation loss.
    #[must_use]
    pub fn best_validation(&self) -> Option<&EpochMetrics> {
        self.epochs
            .iter()
            .filter(|m| m.val_loss.is_some())
            .min_by(|a, b| {
                a.val_loss
                    .partial_cmp(&b.val_loss)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}
