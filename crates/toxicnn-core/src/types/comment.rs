use serde::{Deserialize, Serialize};

use super::label::LabelSet;

/// Text substituted for comments whose text is missing.
pub const MISSING_TEXT_PLACEHOLDER: &str = "_NA_";

/// A raw comment, labeled when it comes from the training set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Row identifier carried through to the submission file.
    pub id: String,
    /// Raw comment text.
    pub text: String,
    /// Category targets; `None` for test comments.
    pub labels: Option<LabelSet>,
}

impl Comment {
    /// Creates a labeled training comment.
    #[must_use]
    pub fn labeled(id: impl Into<String>, text: impl Into<String>, labels: LabelSet) -> Self {
        Self {
            id: id.into(),
            text: fill_missing(text.into()),
            labels: Some(labels),
        }
    }

    /// Creates an unlabeled test comment.
    #[must_use]
    pub fn unlabeled(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: fill_missing(text.into()),
            labels: None,
        }
    }

    /// Returns `true` if the comment carries targets.
    #[must_use]
    pub fn is_labeled(&self) -> bool {
        self.labels.is_some()
    }

    /// Number of space-separated pieces in the raw text.
    ///
    /// Splits on single spaces, so runs of spaces count empty pieces. This is
    /// the length statistic the sequence length is derived from.
    #[must_use]
    pub fn raw_len(&self) -> usize {
        self.text.split(' ').count()
    }
}

fn fill_missing(text: String) -> String {
    if text.is_empty() {
        MISSING_TEXT_PLACEHOLDER.to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_text_is_substituted() {
        let comment = Comment::unlabeled("00001cee341fdb12", "");
        assert_eq!(comment.text, MISSING_TEXT_PLACEHOLDER);
        assert!(!comment.is_labeled());
    }

    #[test]
    fn raw_len_counts_single_space_pieces() {
        let comment = Comment::labeled("a", "I love  cats", LabelSet::clean());
        assert_eq!(comment.raw_len(), 4);
        assert!(comment.is_labeled());

        let comment = Comment::unlabeled("b", "word");
        assert_eq!(comment.raw_len(), 1);
    }
}
