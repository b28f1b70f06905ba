//! # Sequence Encoder
//!
//! Turns filtered token lists into fixed-length id sequences. Out-of-vocabulary
//! tokens are dropped before padding and truncation, so they shorten the
//! encoded content rather than occupying a slot.

use candle_core::{Device, Tensor};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToxicnnError};
use crate::text::vocab::{PAD_ID, Vocabulary};

/// Which end of a sequence padding or truncation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The front of the sequence.
    #[default]
    Pre,
    /// The back of the sequence.
    Post,
}

/// Document-length statistics the sequence length is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthStats {
    /// Number of documents measured.
    pub documents: usize,
    /// Mean raw length.
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator) of the raw length.
    pub std: f64,
    /// `round(mean + std)`, rounding half to even.
    pub max_seq_len: usize,
}

impl LengthStats {
    /// Compute the statistics over raw per-document lengths.
    ///
    /// A single document has a standard deviation of zero.
    ///
    /// # Errors
    ///
    /// Returns `ToxicnnError::EmptyCorpus` when `lengths` is empty.
    pub fn from_lengths(lengths: &[usize]) -> Result<Self> {
        if lengths.is_empty() {
            return Err(ToxicnnError::EmptyCorpus);
        }

        let n = lengths.len() as f64;
        let mean = lengths.iter().map(|&l| l as f64).sum::<f64>() / n;
        let std = if lengths.len() > 1 {
            let var = lengths
                .iter()
                .map(|&l| (l as f64 - mean).powi(2))
                .sum::<f64>()
                / (n - 1.0);
            var.sqrt()
        } else {
            0.0
        };
        let max_seq_len = (mean + std).round_ties_even() as usize;

        Ok(Self {
            documents: lengths.len(),
            mean,
            std,
            max_seq_len,
        })
    }

    /// Compute the statistics over raw texts, measuring each as its number of
    /// single-space-separated pieces.
    pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Result<Self> {
        let lengths: Vec<usize> = texts
            .iter()
            .map(|t| t.as_ref().split(' ').count())
            .collect();
        Self::from_lengths(&lengths)
    }
}

/// Fixed-length encoder from tokens to padded id sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceEncoder {
    max_len: usize,
    padding: Side,
    truncating: Side,
}

impl SequenceEncoder {
    /// Encoder producing sequences of exactly `max_len` ids, padded and
    /// truncated at the front.
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            padding: Side::Pre,
            truncating: Side::Pre,
        }
    }

    /// Set which end receives padding.
    pub fn with_padding(mut self, side: Side) -> Self {
        self.padding = side;
        self
    }

    /// Set which end loses ids when a sequence is too long.
    pub fn with_truncating(mut self, side: Side) -> Self {
        self.truncating = side;
        self
    }

    /// Output length of every encoded sequence.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Encode one comment's filtered tokens.
    ///
    /// # Examples
    /// ```
    /// use toxicnn_core::text::{SequenceEncoder, Vocabulary};
    ///
    /// let vocab = Vocabulary::fit(&[vec!["love", "cats"], vec!["hate", "cats"]], 100);
    /// let encoder = SequenceEncoder::new(4);
    /// assert_eq!(encoder.encode(&vocab, &["love", "dogs", "cats"]), vec![0, 0, 2, 1]);
    /// ```
    pub fn encode<S: AsRef<str>>(&self, vocab: &Vocabulary, tokens: &[S]) -> Vec<u32> {
        self.fit_length(vocab.ids(tokens))
    }

    /// Pad or truncate an already-mapped id sequence to the output length.
    #[must_use]
    pub fn fit_length(&self, mut ids: Vec<u32>) -> Vec<u32> {
        let len = self.max_len;
        if ids.len() > len {
            match self.truncating {
                Side::Pre => {
                    ids.drain(..ids.len() - len);
                }
                Side::Post => ids.truncate(len),
            }
            return ids;
        }

        let missing = len - ids.len();
        match self.padding {
            Side::Pre => {
                let mut padded = vec![PAD_ID; missing];
                padded.extend(ids);
                padded
            }
            Side::Post => {
                ids.resize(len, PAD_ID);
                ids
            }
        }
    }

    /// Encode a corpus into one row-major id matrix.
    pub fn encode_all<S: AsRef<str>>(
        &self,
        vocab: &Vocabulary,
        docs: &[Vec<S>],
    ) -> EncodedSequences {
        let mut ids = Vec::with_capacity(docs.len() * self.max_len);
        for doc in docs {
            ids.extend(self.encode(vocab, doc));
        }
        EncodedSequences {
            ids,
            rows: docs.len(),
            max_len: self.max_len,
        }
    }
}

/// Row-major `[rows, max_len]` matrix of encoded sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedSequences {
    ids: Vec<u32>,
    rows: usize,
    max_len: usize,
}

impl EncodedSequences {
    /// Wrap a flat id buffer.
    ///
    /// # Errors
    ///
    /// Returns `ToxicnnError::ShapeMismatch` if `ids.len() != rows * max_len`.
    pub fn from_flat(ids: Vec<u32>, rows: usize, max_len: usize) -> Result<Self> {
        if ids.len() != rows * max_len {
            return Err(ToxicnnError::ShapeMismatch(format!(
                "{} ids cannot form {rows} rows of length {max_len}",
                ids.len()
            )));
        }
        Ok(Self { ids, rows, max_len })
    }

    /// Number of sequences.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Length of every sequence.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// The ids of sequence `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[u32]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.max_len;
        Some(&self.ids[start..start + self.max_len])
    }

    /// Iterate the sequences in order.
    pub fn iter(&self) -> impl Iterator<Item = &[u32]> {
        (0..self.rows).filter_map(move |i| self.row(i))
    }

    /// New matrix holding rows `indices` in the given order; indices past
    /// the end are skipped.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut ids = Vec::with_capacity(indices.len() * self.max_len);
        let mut rows = 0;
        for row in indices.iter().filter_map(|&i| self.row(i)) {
            ids.extend_from_slice(row);
            rows += 1;
        }
        Self {
            ids,
            rows,
            max_len: self.max_len,
        }
    }

    /// Flat row-major ids.
    #[must_use]
    pub fn as_flat(&self) -> &[u32] {
        &self.ids
    }

    /// `[rows, max_len]` u32 tensor on `device`.
    pub fn to_tensor(&self, device: &Device) -> Result<Tensor> {
        Ok(Tensor::from_vec(
            self.ids.clone(),
            (self.rows, self.max_len),
            device,
        )?)
    }
}
