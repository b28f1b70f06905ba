//! Batched inference.

use candle_core::Tensor;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToxicnnError};
use crate::model::ToxicityCnn;
use crate::text::EncodedSequences;
use crate::types::{Label, NUM_LABELS};

/// `[comments, 6]` probability matrix in label column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Predictions {
    rows: Vec<[f32; NUM_LABELS]>,
}

impl Predictions {
    /// Wrap precomputed rows.
    pub fn from_rows(rows: Vec<[f32; NUM_LABELS]>) -> Self {
        Self { rows }
    }

    /// Number of comments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Probabilities of comment `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f32; NUM_LABELS]> {
        self.rows.get(index)
    }

    /// All probabilities of one label, in comment order.
    #[must_use]
    pub fn column(&self, label: Label) -> Vec<f32> {
        self.rows.iter().map(|r| r[label.index()]).collect()
    }

    /// All rows.
    #[must_use]
    pub fn rows(&self) -> &[[f32; NUM_LABELS]] {
        &self.rows
    }

    /// Iterate rows in comment order.
    pub fn iter(&self) -> impl Iterator<Item = &[f32; NUM_LABELS]> {
        self.rows.iter()
    }
}

/// Runs a trained model over encoded comments without touching its state.
pub struct Predictor<'a> {
    model: &'a ToxicityCnn,
    batch_size: usize,
}

impl<'a> Predictor<'a> {
    /// Predict in batches of `batch_size` comments (at least one).
    pub fn new(model: &'a ToxicityCnn, batch_size: usize) -> Self {
        Self {
            model,
            batch_size: batch_size.max(1),
        }
    }

    /// Per-label probabilities for every row of `sequences`.
    ///
    /// # Errors
    ///
    /// Returns `ToxicnnError::ShapeMismatch` if the sequence length differs
    /// from the model's.
    pub fn predict(&self, sequences: &EncodedSequences) -> Result<Predictions> {
        if sequences.rows() > 0 && sequences.max_len() != self.model.max_seq_len() {
            return Err(ToxicnnError::ShapeMismatch(format!(
                "sequences have length {}, model expects {}",
                sequences.max_len(),
                self.model.max_seq_len()
            )));
        }

        let device = self.model.device();
        let len = sequences.max_len();
        let mut rows = Vec::with_capacity(sequences.rows());

        for chunk in sequences.as_flat().chunks(self.batch_size * len.max(1)) {
            if len == 0 {
                break;
            }
            let batch = chunk.len() / len;
            let ids = Tensor::from_slice(chunk, (batch, len), device)?;
            let probs = self.model.predict_proba(&ids)?.to_vec2::<f32>()?;
            for p in probs {
                let row: [f32; NUM_LABELS] = p.try_into().map_err(|p: Vec<f32>| {
                    ToxicnnError::ShapeMismatch(format!(
                        "model produced {} outputs, expected {NUM_LABELS}",
                        p.len()
                    ))
                })?;
                rows.push(row);
            }
        }

        tracing::debug!(rows = rows.len(), "predicted");
        Ok(Predictions { rows })
    }
}
