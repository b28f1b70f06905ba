//! Top-level configuration of a preprocessing and training run.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToxicnnError};
use crate::model::ModelConfig;
use crate::text::vocab::DEFAULT_MAX_WORDS;
use crate::train::TrainConfig;

/// Vocabulary settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabConfig {
    /// Vocabulary cap; ids stay below this value.
    pub max_words: usize,
}

impl Default for VocabConfig {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
        }
    }
}

/// Every setting of a run, each defaulted when absent from a config file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Vocabulary settings.
    pub vocab: VocabConfig,
    /// Architecture settings.
    pub model: ModelConfig,
    /// Optimisation settings.
    pub train: TrainConfig,
    /// Pinned sequence length; derived from the training texts when `None`.
    pub max_seq_len: Option<usize>,
}

impl PipelineConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the vocabulary cap.
    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.vocab.max_words = max_words;
        self
    }

    /// Replace the model settings.
    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = model;
        self
    }

    /// Replace the training settings.
    pub fn with_train(mut self, train: TrainConfig) -> Self {
        self.train = train;
        self
    }

    /// Pin the sequence length instead of deriving it.
    pub fn with_max_seq_len(mut self, max_seq_len: usize) -> Self {
        self.max_seq_len = Some(max_seq_len);
        self
    }

    /// Check the settings that do not depend on the data.
    ///
    /// A derived sequence length is checked against the model once it is
    /// known.
    ///
    /// # Errors
    ///
    /// Returns `ToxicnnError::InvalidConfig` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.vocab.max_words == 0 {
            return Err(ToxicnnError::InvalidConfig(
                "max_words must be positive".into(),
            ));
        }
        let seq_len = self.max_seq_len.unwrap_or(self.model.pool_size);
        self.model.validate(seq_len)?;
        self.train.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = PipelineConfig::default();
        assert_eq!(config.vocab.max_words, 100_000);
        assert_eq!(config.max_seq_len, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{"train": {"epochs": 2}, "max_seq_len": 150}"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.train.epochs, 2);
        assert_eq!(config.train.batch_size, 256);
        assert_eq!(config.model.num_filters, 64);
        assert_eq!(config.max_seq_len, Some(150));
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(PipelineConfig::new().with_max_words(0).validate().is_err());
        assert!(PipelineConfig::new().with_max_seq_len(1).validate().is_err());
        let bad_train = TrainConfig::new().with_batch_size(0);
        assert!(PipelineConfig::new().with_train(bad_train).validate().is_err());
    }
}
