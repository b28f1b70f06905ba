use serde::{Deserialize, Serialize};

use crate::embedding::DEFAULT_EMBED_DIM;
use crate::error::{Result, ToxicnnError};

/// Architecture and regularisation settings of the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Embedding width; must match the pretrained vectors.
    pub embed_dim: usize,
    /// Output filters of both convolutions.
    pub num_filters: usize,
    /// Convolution kernel width.
    pub kernel_size: usize,
    /// Width of the max-pooling window between the convolutions.
    pub pool_size: usize,
    /// Units of the hidden dense layer.
    pub hidden_units: usize,
    /// Dropout rate applied before the hidden dense layer while training.
    pub dropout: f64,
    /// L2 penalty coefficient on the hidden dense kernel.
    pub weight_decay: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embed_dim: DEFAULT_EMBED_DIM,
            num_filters: 64,
            kernel_size: 7,
            pool_size: 2,
            hidden_units: 32,
            dropout: 0.5,
            weight_decay: 1e-4,
        }
    }
}

impl ModelConfig {
    /// Create a model configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the embedding width.
    pub fn with_embed_dim(mut self, embed_dim: usize) -> Self {
        self.embed_dim = embed_dim;
        self
    }

    /// Set the number of convolution filters.
    pub fn with_num_filters(mut self, num_filters: usize) -> Self {
        self.num_filters = num_filters;
        self
    }

    /// Set the hidden dense width.
    pub fn with_hidden_units(mut self, hidden_units: usize) -> Self {
        self.hidden_units = hidden_units;
        self
    }

    /// Set the dropout rate.
    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    /// Set the L2 penalty coefficient.
    pub fn with_weight_decay(mut self, weight_decay: f64) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Convolution padding that keeps the sequence length unchanged.
    #[must_use]
    pub fn same_padding(&self) -> usize {
        (self.kernel_size - 1) / 2
    }

    /// Check the configuration against the sequence length it will run on.
    ///
    /// # Errors
    ///
    /// Returns `ToxicnnError::InvalidConfig` describing the first bad value.
    pub fn validate(&self, max_seq_len: usize) -> Result<()> {
        let fail = |msg: String| Err(ToxicnnError::InvalidConfig(msg));
        if self.embed_dim == 0 {
            return fail("embed_dim must be positive".into());
        }
        if self.num_filters == 0 || self.hidden_units == 0 {
            return fail("num_filters and hidden_units must be positive".into());
        }
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return fail(format!("kernel_size must be odd, got {}", self.kernel_size));
        }
        if self.pool_size == 0 {
            return fail("pool_size must be positive".into());
        }
        if max_seq_len < self.pool_size {
            return fail(format!(
                "sequence length {max_seq_len} is shorter than the pooling window {}",
                self.pool_size
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return fail(format!("dropout must be in [0, 1), got {}", self.dropout));
        }
        if self.weight_decay < 0.0 || !self.weight_decay.is_finite() {
            return fail(format!("weight_decay must be >= 0, got {}", self.weight_decay));
        }
        Ok(())
    }
}
