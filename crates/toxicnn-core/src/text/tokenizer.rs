//! # Comment Tokenizer
//!
//! Splits raw comment text into case-folded word tokens and drops stop words.
//! No stemming or lemmatization; every comment is tokenized independently.

use std::collections::HashSet;

use regex::Regex;

use crate::error::Result;
use crate::text::stopwords::{ENGLISH_STOP_WORDS, PUNCTUATION_STOP_WORDS};

/// Tokenizer producing the filtered token stream of a comment.
#[derive(Debug, Clone)]
pub struct CommentTokenizer {
    word_re: Regex,
    stop_words: HashSet<String>,
}

impl CommentTokenizer {
    /// Create a tokenizer with the default English stop words plus the
    /// punctuation literals.
    ///
    /// # Errors
    ///
    /// Returns `ToxicnnError::Regex` if the word pattern fails to compile
    /// (should never happen with the static pattern used here).
    pub fn new() -> Result<Self> {
        let stop_words = ENGLISH_STOP_WORDS
            .iter()
            .chain(PUNCTUATION_STOP_WORDS)
            .map(|w| (*w).to_string())
            .collect();
        Self::with_stop_words(stop_words)
    }

    /// Create a tokenizer with a custom stop-word set.
    ///
    /// Stop words are compared against case-folded tokens, so they should be
    /// lowercase.
    pub fn with_stop_words(stop_words: HashSet<String>) -> Result<Self> {
        Ok(Self {
            word_re: Regex::new(r"\w+")?,
            stop_words,
        })
    }

    /// Tokenize a comment into its filtered, lowercase tokens.
    ///
    /// Tokens are maximal runs of word characters (letters, digits, underscore).
    ///
    /// # Examples
    /// ```
    /// use toxicnn_core::text::CommentTokenizer;
    ///
    /// let tokenizer = CommentTokenizer::new().unwrap();
    /// assert_eq!(tokenizer.tokenize("I love cats!"), vec!["love", "cats"]);
    /// ```
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.word_re
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .filter(|token| !self.stop_words.contains(token))
            .collect()
    }

    /// Tokenize every comment of a corpus, preserving order.
    pub fn tokenize_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Vec<String>> {
        texts.iter().map(|t| self.tokenize(t.as_ref())).collect()
    }

    /// Returns `true` if `token` is filtered out.
    #[must_use]
    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }
}
