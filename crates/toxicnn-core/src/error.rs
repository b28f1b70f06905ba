use thiserror::Error;

/// Errors that can occur during preprocessing, training or inference.
#[derive(Debug, Error)]
pub enum ToxicnnError {
    /// A corpus needed to derive a statistic contains no documents.
    #[error("corpus is empty")]
    EmptyCorpus,

    /// A configuration value is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A pretrained vector does not have the expected width.
    #[error("embedding for {token:?} has {found} components, expected {expected}")]
    DimensionMismatch {
        /// The token whose vector was rejected.
        token: String,
        /// Width required by the lookup or the model.
        expected: usize,
        /// Width actually provided.
        found: usize,
    },

    /// Input tensors or row collections disagree on their shapes.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The loss became NaN or infinite; there is no recovery path.
    #[error("training diverged: non-finite loss at epoch {epoch}, batch {batch}")]
    TrainingDiverged {
        /// 1-based epoch number.
        epoch: usize,
        /// 0-based batch index within the epoch.
        batch: usize,
    },

    /// A training comment has no category targets.
    #[error("training comment {id:?} has no labels")]
    MissingLabels {
        /// Row identifier of the comment.
        id: String,
    },

    /// Saved model weights could not be restored.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The tokenizer pattern failed to compile (static pattern, should not happen).
    #[error("regex compilation error: {0}")]
    Regex(#[from] regex::Error),

    /// Candle tensor framework error.
    #[error("tensor error: {0}")]
    Candle(#[from] candle_core::Error),
}

/// Result type alias for toxicnn operations.
pub type Result<T> = std::result::Result<T, ToxicnnError>;
