//! The classifier and its building blocks.

pub mod cnn;
pub mod config;
pub mod init;
pub mod loss;

pub use cnn::{LayerSummary, PARAM_NAMES, ToxicityCnn};
pub use config::ModelConfig;
pub use loss::{binary_cross_entropy_with_logits, correct_predictions};
