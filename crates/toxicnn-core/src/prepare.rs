//! # Corpus Preparation
//!
//! Turns raw train and test comments into fixed-length id sequences:
//!
//! 1. tokenize every comment and drop stop words
//! 2. fit one vocabulary on the train tokens followed by the test tokens
//! 3. derive the sequence length from the raw training texts (unless pinned)
//! 4. encode both sets with pre-padding and pre-truncation
//!
//! Diagnostics come back as a [`PreprocessReport`] instead of being printed.

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::{Result, ToxicnnError};
use crate::text::{
    CommentTokenizer, EncodedSequences, LengthStats, SequenceEncoder, Vocabulary,
    VocabularyReport,
};
use crate::types::{Comment, LabelSet};

/// Tokenizer, fitted vocabulary and sequence length, ready to encode text.
#[derive(Debug, Clone)]
pub struct TextPipeline {
    tokenizer: CommentTokenizer,
    vocabulary: Vocabulary,
    encoder: SequenceEncoder,
}

impl TextPipeline {
    /// Assemble a pipeline from a fitted vocabulary.
    pub fn new(tokenizer: CommentTokenizer, vocabulary: Vocabulary, max_seq_len: usize) -> Self {
        Self {
            tokenizer,
            vocabulary,
            encoder: SequenceEncoder::new(max_seq_len),
        }
    }

    /// Encode raw texts into `[texts, max_seq_len]` sequences.
    pub fn encode_texts<S: AsRef<str>>(&self, texts: &[S]) -> EncodedSequences {
        let tokens = self.tokenizer.tokenize_all(texts);
        self.encoder.encode_all(&self.vocabulary, &tokens)
    }

    /// Encode comments in order.
    pub fn encode_comments(&self, comments: &[Comment]) -> EncodedSequences {
        let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
        self.encode_texts(&texts)
    }

    /// The fitted vocabulary.
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// The tokenizer.
    #[must_use]
    pub fn tokenizer(&self) -> &CommentTokenizer {
        &self.tokenizer
    }

    /// Length of every encoded sequence.
    #[must_use]
    pub fn max_seq_len(&self) -> usize {
        self.encoder.max_len()
    }
}

/// Diagnostics of [`prepare`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessReport {
    /// Training comments processed.
    pub train_comments: usize,
    /// Test comments processed.
    pub test_comments: usize,
    /// Vocabulary size and cap.
    pub vocabulary: VocabularyReport,
    /// Length statistics of the training texts; `None` when the length was
    /// pinned.
    pub lengths: Option<LengthStats>,
    /// Sequence length used for both sets.
    pub max_seq_len: usize,
}

/// Encoded train and test sets plus the pipeline that produced them.
#[derive(Debug, Clone)]
pub struct PreparedCorpus {
    /// Reusable text pipeline.
    pub pipeline: TextPipeline,
    /// Encoded training comments.
    pub train: EncodedSequences,
    /// Targets of the training comments, in the same order.
    pub train_labels: Vec<LabelSet>,
    /// Encoded test comments.
    pub test: EncodedSequences,
    /// Diagnostics.
    pub report: PreprocessReport,
}

/// Prepare labeled `train` and unlabeled `test` comments for the model.
///
/// # Errors
///
/// - `MissingLabels` if a training comment has no targets.
/// - `EmptyCorpus` if `train` is empty and no sequence length is pinned.
/// - `InvalidConfig` if the resulting length does not suit the model.
pub fn prepare(
    train: &[Comment],
    test: &[Comment],
    config: &PipelineConfig,
) -> Result<PreparedCorpus> {
    let train_labels = train
        .iter()
        .map(|c| {
            c.labels.ok_or_else(|| ToxicnnError::MissingLabels {
                id: c.id.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let tokenizer = CommentTokenizer::new()?;
    let texts = |comments: &[Comment]| -> Vec<String> {
        comments.iter().map(|c| c.text.clone()).collect()
    };
    let train_tokens = tokenizer.tokenize_all(&texts(train));
    let test_tokens = tokenizer.tokenize_all(&texts(test));

    let mut corpus = Vec::with_capacity(train_tokens.len() + test_tokens.len());
    corpus.extend(train_tokens.iter().cloned());
    corpus.extend(test_tokens.iter().cloned());
    let vocabulary = Vocabulary::fit(&corpus, config.vocab.max_words);
    let vocab_report = vocabulary.report();
    tracing::info!(
        distinct = vocab_report.distinct_tokens,
        assigned = vocab_report.assigned,
        dropped = vocab_report.dropped,
        "fitted vocabulary"
    );

    let (lengths, max_seq_len) = match config.max_seq_len {
        Some(len) => (None, len),
        None => {
            let raw: Vec<usize> = train.iter().map(Comment::raw_len).collect();
            let stats = LengthStats::from_lengths(&raw)?;
            tracing::info!(
                mean = stats.mean,
                std = stats.std,
                max_seq_len = stats.max_seq_len,
                "derived sequence length"
            );
            (Some(stats), stats.max_seq_len)
        }
    };
    config.model.validate(max_seq_len)?;

    let encoder = SequenceEncoder::new(max_seq_len);
    let train_seqs = encoder.encode_all(&vocabulary, &train_tokens);
    let test_seqs = encoder.encode_all(&vocabulary, &test_tokens);

    let report = PreprocessReport {
        train_comments: train.len(),
        test_comments: test.len(),
        vocabulary: vocab_report,
        lengths,
        max_seq_len,
    };

    Ok(PreparedCorpus {
        pipeline: TextPipeline::new(tokenizer, vocabulary, max_seq_len),
        train: train_seqs,
        train_labels,
        test: test_seqs,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Label;

    fn config() -> PipelineConfig {
        PipelineConfig::new().with_model(crate::model::ModelConfig::new().with_embed_dim(4))
    }

    #[test]
    fn prepares_both_sets_with_one_length() {
        let train = vec![
            Comment::labeled("a", "you are a fool fool", LabelSet::from_active(&[Label::Insult])),
            Comment::labeled("b", "have a nice day", LabelSet::clean()),
            Comment::labeled("c", "fool", LabelSet::from_active(&[Label::Toxic])),
        ];
        let test = vec![Comment::unlabeled("t", "nice fool")];

        let prepared = prepare(&train, &test, &config()).unwrap();
        // raw lengths 5, 4, 1: mean 3.33, std 2.08, round(5.41) = 5
        assert_eq!(prepared.report.max_seq_len, 5);
        assert_eq!(prepared.train.rows(), 3);
        assert_eq!(prepared.test.rows(), 1);
        assert_eq!(prepared.test.max_len(), 5);
        assert_eq!(prepared.train_labels.len(), 3);

        let vocab = prepared.pipeline.vocabulary();
        // "fool" appears three times and ranks first
        assert_eq!(vocab.id("fool"), Some(1));
        assert!(vocab.id("nice").is_some());
        assert!(vocab.id("you").is_none());

        let test_row = prepared.test.row(0).unwrap();
        assert_eq!(&test_row[3..], &[vocab.id("nice").unwrap(), 1]);
        assert_eq!(&test_row[..3], &[0, 0, 0]);
    }

    #[test]
    fn test_tokens_join_the_vocabulary() {
        let train = vec![Comment::labeled("a", "cats purr", LabelSet::clean())];
        let test = vec![Comment::unlabeled("t", "dogs")];
        let prepared = prepare(&train, &test, &config()).unwrap();
        assert!(prepared.pipeline.vocabulary().id("dogs").is_some());
    }

    #[test]
    fn derived_length_below_pooling_window_is_rejected() {
        let train = vec![Comment::labeled("a", "cats", LabelSet::clean())];
        let err = prepare(&train, &[], &config()).unwrap_err();
        assert!(matches!(err, ToxicnnError::InvalidConfig(_)));

        let pinned = prepare(&train, &[], &config().with_max_seq_len(4)).unwrap();
        assert_eq!(pinned.train.row(0).unwrap(), &[0, 0, 0, 1]);
    }

    #[test]
    fn pinned_length_skips_statistics() {
        let train = vec![Comment::labeled("a", "one two three", LabelSet::clean())];
        let prepared = prepare(&train, &[], &config().with_max_seq_len(8)).unwrap();
        assert_eq!(prepared.report.max_seq_len, 8);
        assert!(prepared.report.lengths.is_none());
        assert_eq!(prepared.train.max_len(), 8);
    }

    #[test]
    fn unlabeled_training_comment_is_rejected() {
        let train = vec![Comment::unlabeled("x", "hello")];
        let err = prepare(&train, &[], &config()).unwrap_err();
        assert!(matches!(err, ToxicnnError::MissingLabels { id } if id == "x"));
    }

    #[test]
    fn empty_training_set_needs_a_pinned_length() {
        assert!(matches!(
            prepare(&[], &[], &config()),
            Err(ToxicnnError::EmptyCorpus)
        ));
        let prepared = prepare(&[], &[], &config().with_max_seq_len(4)).unwrap();
        assert!(prepared.pipeline.vocabulary().is_empty());
    }

    #[test]
    fn pipeline_encodes_new_text() {
        let train = vec![
            Comment::labeled("a", "I love cats", LabelSet::clean()),
            Comment::labeled("b", "I hate cats", LabelSet::clean()),
        ];
        let prepared = prepare(&train, &[], &config().with_max_seq_len(3)).unwrap();
        let encoded = prepared.pipeline.encode_texts(&["cats are great"]);
        let cats = prepared.pipeline.vocabulary().id("cats").unwrap();
        assert_eq!(encoded.row(0).unwrap(), &[0, 0, cats]);
    }
}
