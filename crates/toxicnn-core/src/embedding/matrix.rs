//! # Embedding Aligner
//!
//! Builds the frozen embedding table indexed by vocabulary id. Rows for the
//! padding id and for tokens without a pretrained vector stay zero.

use candle_core::{Device, Tensor};
use oorandom::Rand32;
use serde::{Deserialize, Serialize};

use crate::embedding::index::EmbeddingIndex;
use crate::error::{Result, ToxicnnError};
use crate::text::vocab::Vocabulary;

/// Default embedding width.
pub const DEFAULT_EMBED_DIM: usize = 300;

/// Dense `[rows, dim]` table of embedding vectors, row `i` for vocabulary id `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    rows: usize,
    dim: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// All-zero matrix.
    pub fn zeros(rows: usize, dim: usize) -> Self {
        Self {
            rows,
            dim,
            data: vec![0.0; rows * dim],
        }
    }

    /// Align pretrained vectors to the vocabulary.
    ///
    /// The matrix has one row per embedding slot the vocabulary needs
    /// (`nb_words`, padding row included). Each token with id below
    /// `nb_words` gets its pretrained vector copied in; tokens without a
    /// non-empty vector keep a zero row and are listed in the report.
    ///
    /// # Errors
    ///
    /// Returns `ToxicnnError::DimensionMismatch` if a pretrained vector's
    /// width differs from `dim`.
    pub fn align(
        vocab: &Vocabulary,
        index: &EmbeddingIndex,
        dim: usize,
    ) -> Result<(Self, AlignmentReport)> {
        let nb_words = vocab.num_rows().min(vocab.max_words().max(1));
        let mut matrix = Self::zeros(nb_words, dim);
        let mut not_found = Vec::new();
        let mut found = 0usize;

        for (id, token) in vocab.iter() {
            let row = id as usize;
            if row >= nb_words {
                continue;
            }
            match index.get(token) {
                Some(vector) if !vector.is_empty() => {
                    if vector.len() != dim {
                        return Err(ToxicnnError::DimensionMismatch {
                            token: token.to_string(),
                            expected: dim,
                            found: vector.len(),
                        });
                    }
                    matrix.row_mut(row).copy_from_slice(vector);
                    found += 1;
                }
                _ => not_found.push(token.to_string()),
            }
        }

        let zero_rows = (0..nb_words).filter(|&r| matrix.is_zero_row(r)).count();
        tracing::debug!(nb_words, found, zero_rows, "aligned embedding matrix");

        let report = AlignmentReport {
            nb_words,
            dim,
            found,
            not_found,
            zero_rows,
        };
        Ok((matrix, report))
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Width of every row.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.rows()`.
    #[must_use]
    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.dim..(index + 1) * self.dim]
    }

    fn row_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.data[index * self.dim..(index + 1) * self.dim]
    }

    /// Returns `true` if every component of row `index` is zero.
    #[must_use]
    pub fn is_zero_row(&self, index: usize) -> bool {
        self.row(index).iter().all(|&v| v == 0.0)
    }

    /// `[rows, dim]` f32 tensor on `device`.
    pub fn to_tensor(&self, device: &Device) -> Result<Tensor> {
        Ok(Tensor::from_vec(
            self.data.clone(),
            (self.rows, self.dim),
            device,
        )?)
    }
}

/// Diagnostics produced while aligning the embedding matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// Rows in the matrix, padding row included.
    pub nb_words: usize,
    /// Row width.
    pub dim: usize,
    /// Vocabulary tokens that received a pretrained vector.
    pub found: usize,
    /// Vocabulary tokens without a pretrained vector, in id order.
    pub not_found: Vec<String>,
    /// All-zero rows, the padding row included.
    pub zero_rows: usize,
}

impl AlignmentReport {
    /// Fraction of vocabulary rows covered by pretrained vectors.
    #[must_use]
    pub fn coverage(&self) -> f64 {
        let tokens = self.found + self.not_found.len();
        if tokens == 0 {
            0.0
        } else {
            self.found as f64 / tokens as f64
        }
    }

    /// Seeded sample of up to `n` distinct not-found tokens.
    #[must_use]
    pub fn sample_not_found(&self, n: usize, seed: u64) -> Vec<&str> {
        let mut pool: Vec<&str> = self.not_found.iter().map(String::as_str).collect();
        let take = n.min(pool.len());
        let mut rng = Rand32::new(seed);
        for i in 0..take {
            let j = i + rng.rand_range(0..(pool.len() - i) as u32) as usize;
            pool.swap(i, j);
        }
        pool.truncate(take);
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary::fit(&[vec!["cats", "love"], vec!["hate", "cats"]], 100)
    }

    fn index() -> EmbeddingIndex {
        let mut index = EmbeddingIndex::new();
        index.insert("cats", vec![1.0, 2.0, 3.0]).unwrap();
        index.insert("love", vec![-1.0, 0.5, 0.25]).unwrap();
        index.insert("unused", vec![9.0, 9.0, 9.0]).unwrap();
        index
    }

    #[test]
    fn rows_match_pretrained_vectors_or_are_zero() {
        let vocab = vocab();
        let index = index();
        let (matrix, report) = EmbeddingMatrix::align(&vocab, &index, 3).unwrap();

        assert_eq!(matrix.rows(), 4);
        assert_eq!(report.nb_words, 4);
        assert!(matrix.is_zero_row(0));
        for (id, token) in vocab.iter() {
            let row = matrix.row(id as usize);
            match index.get(token) {
                Some(v) => assert_eq!(row, v),
                None => assert!(matrix.is_zero_row(id as usize)),
            }
        }
    }

    #[test]
    fn missing_token_reported_exactly_once() {
        let (matrix, report) = EmbeddingMatrix::align(&vocab(), &index(), 3).unwrap();
        let hate = vocab().id("hate").unwrap() as usize;

        assert!(matrix.is_zero_row(hate));
        assert_eq!(report.not_found, vec!["hate".to_string()]);
        assert_eq!(report.found, 2);
        // padding row + "hate"
        assert_eq!(report.zero_rows, 2);
        assert!((report.coverage() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_vector_counts_as_missing() {
        let mut index = index();
        index.insert("hate", Vec::new()).unwrap();
        let (_, report) = EmbeddingMatrix::align(&vocab(), &index, 3).unwrap();
        assert_eq!(report.not_found, vec!["hate".to_string()]);
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let err = EmbeddingMatrix::align(&vocab(), &index(), 4).unwrap_err();
        assert!(matches!(err, ToxicnnError::DimensionMismatch { expected: 4, found: 3, .. }));
    }

    #[test]
    fn empty_vocabulary_yields_padding_row_only() {
        let empty: Vec<Vec<String>> = Vec::new();
        let vocab = Vocabulary::fit(&empty, 100);
        let (matrix, report) = EmbeddingMatrix::align(&vocab, &index(), 3).unwrap();
        assert_eq!(matrix.rows(), 1);
        assert_eq!(report.zero_rows, 1);
        assert!(report.not_found.is_empty());
        assert_eq!(report.coverage(), 0.0);
    }

    #[test]
    fn not_found_sample_is_seeded_and_distinct() {
        let report = AlignmentReport {
            nb_words: 11,
            dim: 3,
            found: 0,
            not_found: (0..10).map(|i| format!("w{i}")).collect(),
            zero_rows: 11,
        };
        let a = report.sample_not_found(4, 7);
        let b = report.sample_not_found(4, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        let unique: std::collections::HashSet<_> = a.iter().collect();
        assert_eq!(unique.len(), 4);

        assert_eq!(report.sample_not_found(50, 1).len(), 10);
    }

    #[test]
    fn tensor_has_matrix_shape() {
        let (matrix, _) = EmbeddingMatrix::align(&vocab(), &index(), 3).unwrap();
        let tensor = matrix.to_tensor(&Device::Cpu).unwrap();
        assert_eq!(tensor.dims(), &[4, 3]);
    }
}
