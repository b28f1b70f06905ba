//! Pretrained word → vector lookup.

use std::collections::HashMap;

use crate::error::{Result, ToxicnnError};

/// Immutable-after-load store of pretrained word vectors.
///
/// All non-empty vectors share one width, fixed by the first one inserted.
/// Callers share a loaded index by reference.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingIndex {
    dim: Option<usize>,
    vectors: HashMap<String, Vec<f32>>,
}

impl EmbeddingIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index expecting vectors of width `dim`.
    pub fn with_dim(dim: usize) -> Self {
        Self {
            dim: Some(dim),
            vectors: HashMap::new(),
        }
    }

    /// Add or replace the vector for `token`.
    ///
    /// Empty vectors are stored but count as missing during alignment.
    ///
    /// # Errors
    ///
    /// Returns `ToxicnnError::DimensionMismatch` if a non-empty vector's width
    /// differs from the index width.
    pub fn insert(&mut self, token: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        let token = token.into();
        if !vector.is_empty() {
            match self.dim {
                Some(dim) if dim != vector.len() => {
                    return Err(ToxicnnError::DimensionMismatch {
                        token,
                        expected: dim,
                        found: vector.len(),
                    });
                }
                Some(_) => {}
                None => self.dim = Some(vector.len()),
            }
        }
        self.vectors.insert(token, vector);
        Ok(())
    }

    /// Vector for `token`, if present.
    #[must_use]
    pub fn get(&self, token: &str) -> Option<&[f32]> {
        self.vectors.get(token).map(Vec::as_slice)
    }

    /// Returns `true` if `token` has an entry.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.vectors.contains_key(token)
    }

    /// Width of the stored vectors, once known.
    #[must_use]
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    /// Number of stored tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl FromIterator<(String, Vec<f32>)> for EmbeddingIndex {
    /// Collects vectors without width checks; the first non-empty vector
    /// fixes the reported width.
    fn from_iter<I: IntoIterator<Item = (String, Vec<f32>)>>(iter: I) -> Self {
        let vectors: HashMap<String, Vec<f32>> = iter.into_iter().collect();
        let dim = vectors.values().map(Vec::len).find(|&len| len > 0);
        Self { dim, vectors }
    }
}
