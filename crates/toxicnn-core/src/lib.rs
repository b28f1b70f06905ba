//! # toxicnn Core
//!
//! Multi-label toxicity classification of short comments: text preprocessing
//! (tokenizer, vocabulary, sequence encoding), pretrained embedding alignment
//! and a convolutional classifier trained with candle.
//!
//! ## Quick Start
//!
//! ```rust
//! use toxicnn_core::text::{CommentTokenizer, SequenceEncoder, Vocabulary};
//!
//! let tokenizer = CommentTokenizer::new().unwrap();
//! let docs = tokenizer.tokenize_all(&["I love cats", "I hate cats"]);
//! let vocab = Vocabulary::fit(&docs, 100);
//!
//! assert_eq!(vocab.id("cats"), Some(1));
//! assert_eq!(vocab.id("i"), None);
//!
//! let encoder = SequenceEncoder::new(4);
//! assert_eq!(encoder.encode(&vocab, &docs[0]), vec![0, 0, 2, 1]);
//! ```
pub mod config;
pub mod embedding;
pub mod error;
pub mod eval;
pub mod model;
pub mod predict;
pub mod prepare;
pub mod rng;
pub mod text;
pub mod train;
pub mod types;

// Re-export primary API
pub use config::{PipelineConfig, VocabConfig};
pub use embedding::{AlignmentReport, EmbeddingIndex, EmbeddingMatrix};
pub use error::{Result, ToxicnnError};
pub use eval::{ColumnAuc, column_auc, roc_auc};
pub use model::{ModelConfig, ToxicityCnn};
pub use predict::{Predictions, Predictor};
pub use prepare::{PreparedCorpus, PreprocessReport, TextPipeline, prepare};
pub use text::{CommentTokenizer, EncodedSequences, SequenceEncoder, Vocabulary};
pub use train::{StopReason, TrainConfig, Trainer, TrainingHistory, TrainingOutcome};
pub use types::{Comment, Label, LabelSet, NUM_LABELS};
