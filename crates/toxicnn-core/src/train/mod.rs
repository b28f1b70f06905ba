//! Fitting the classifier.

pub mod config;
pub mod early_stopping;
pub mod history;
pub mod split;
pub mod trainer;

pub use config::TrainConfig;
pub use early_stopping::EarlyStopping;
pub use history::{EpochMetrics, StopReason, TrainingHistory};
pub use split::ValidationSplit;
pub use trainer::{Trainer, TrainingOutcome};
