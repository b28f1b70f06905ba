//! # Vocabulary
//!
//! Frequency-ranked token → id mapping built once over the train and test
//! corpora. Id 0 is reserved for padding and is never assigned to a token.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Id reserved for padding positions.
pub const PAD_ID: u32 = 0;

/// Default cap on the number of embedding rows (padding row included).
pub const DEFAULT_MAX_WORDS: usize = 100_000;

/// Builder counting token frequencies across a corpus.
#[derive(Debug, Clone)]
pub struct VocabularyBuilder {
    max_words: usize,
    // token -> (count, first-seen order)
    counts: HashMap<String, (u64, usize)>,
}

impl VocabularyBuilder {
    /// Create a builder whose vocabulary emits ids strictly below `max_words`.
    pub fn new(max_words: usize) -> Self {
        Self {
            max_words,
            counts: HashMap::new(),
        }
    }

    /// Count the tokens of one document.
    pub fn add_document<S: AsRef<str>>(&mut self, tokens: &[S]) {
        for token in tokens {
            let next = self.counts.len();
            let entry = self
                .counts
                .entry(token.as_ref().to_string())
                .or_insert((0, next));
            entry.0 += 1;
        }
    }

    /// Count every document of a corpus, in order.
    pub fn add_documents<S: AsRef<str>>(&mut self, docs: &[Vec<S>]) -> &mut Self {
        for doc in docs {
            self.add_document(doc);
        }
        self
    }

    /// Rank the counted tokens and assign ids.
    ///
    /// Tokens are ordered by descending frequency, ties broken by first
    /// appearance. Ids `1..=min(max_words - 1, distinct)` are assigned in rank
    /// order; lower-ranked tokens get no id.
    #[must_use]
    pub fn build(self) -> Vocabulary {
        let distinct_tokens = self.counts.len();
        let mut ranked: Vec<(String, u64, usize)> = self
            .counts
            .into_iter()
            .map(|(token, (count, first_seen))| (token, count, first_seen))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.cmp(&b.2)));
        ranked.truncate(self.max_words.saturating_sub(1));

        let (tokens, counts) = ranked
            .into_iter()
            .map(|(token, count, _)| (token, count))
            .unzip();

        Vocabulary::from_parts(self.max_words, distinct_tokens, tokens, counts)
    }
}

/// Bounded token → id mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "VocabularyRepr", into = "VocabularyRepr")]
pub struct Vocabulary {
    max_words: usize,
    distinct_tokens: usize,
    // tokens[id - 1] is the token with that id
    tokens: Vec<String>,
    counts: Vec<u64>,
    index: HashMap<String, u32>,
}

impl Vocabulary {
    /// Build a vocabulary from the tokenized documents of a corpus.
    ///
    /// # Examples
    /// ```
    /// use toxicnn_core::text::Vocabulary;
    ///
    /// let docs = vec![vec!["love", "cats"], vec!["hate", "cats"]];
    /// let vocab = Vocabulary::fit(&docs, 100);
    /// assert_eq!(vocab.id("cats"), Some(1));
    /// assert_eq!(vocab.id("love"), Some(2));
    /// assert_eq!(vocab.id("hate"), Some(3));
    /// ```
    pub fn fit<S: AsRef<str>>(docs: &[Vec<S>], max_words: usize) -> Self {
        let mut builder = VocabularyBuilder::new(max_words);
        builder.add_documents(docs);
        builder.build()
    }

    fn from_parts(
        max_words: usize,
        distinct_tokens: usize,
        tokens: Vec<String>,
        counts: Vec<u64>,
    ) -> Self {
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as u32 + 1))
            .collect();
        Self {
            max_words,
            distinct_tokens,
            tokens,
            counts,
            index,
        }
    }

    /// Id of `token`, or `None` if it is out of vocabulary.
    #[must_use]
    pub fn id(&self, token: &str) -> Option<u32> {
        self.index.get(token).copied()
    }

    /// Token with id `id`, or `None` for the padding id and unassigned ids.
    #[must_use]
    pub fn token(&self, id: u32) -> Option<&str> {
        let slot = (id as usize).checked_sub(1)?;
        self.tokens.get(slot).map(String::as_str)
    }

    /// Corpus frequency of the token with id `id`.
    #[must_use]
    pub fn count(&self, id: u32) -> Option<u64> {
        let slot = (id as usize).checked_sub(1)?;
        self.counts.get(slot).copied()
    }

    /// Map tokens to ids, skipping out-of-vocabulary tokens.
    pub fn ids<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<u32> {
        tokens.iter().filter_map(|t| self.id(t.as_ref())).collect()
    }

    /// Map ids back to tokens, skipping padding and unassigned ids.
    pub fn decode(&self, ids: &[u32]) -> Vec<&str> {
        ids.iter().filter_map(|&id| self.token(id)).collect()
    }

    /// Number of tokens with an assigned id.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if no token has an id.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of embedding rows the vocabulary needs, padding row included.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.tokens.len() + 1
    }

    /// Cap the vocabulary was built with.
    #[must_use]
    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// Distinct tokens seen while fitting, including those beyond the cap.
    #[must_use]
    pub fn distinct_tokens(&self) -> usize {
        self.distinct_tokens
    }

    /// Iterate `(id, token)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (i as u32 + 1, t.as_str()))
    }

    /// Size diagnostics for reporting.
    #[must_use]
    pub fn report(&self) -> VocabularyReport {
        VocabularyReport {
            distinct_tokens: self.distinct_tokens,
            assigned: self.tokens.len(),
            dropped: self.distinct_tokens.saturating_sub(self.tokens.len()),
            max_words: self.max_words,
        }
    }
}

/// Vocabulary size diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyReport {
    /// Distinct tokens in the corpus.
    pub distinct_tokens: usize,
    /// Tokens that received an id.
    pub assigned: usize,
    /// Tokens beyond the cap, silently dropped at encode time.
    pub dropped: usize,
    /// Configured cap.
    pub max_words: usize,
}

#[derive(Clone, Serialize, Deserialize)]
struct VocabularyRepr {
    max_words: usize,
    distinct_tokens: usize,
    tokens: Vec<String>,
    counts: Vec<u64>,
}

impl From<VocabularyRepr> for Vocabulary {
    fn from(repr: VocabularyRepr) -> Self {
        Self::from_parts(repr.max_words, repr.distinct_tokens, repr.tokens, repr.counts)
    }
}

impl From<Vocabulary> for VocabularyRepr {
    fn from(vocab: Vocabulary) -> Self {
        Self {
            max_words: vocab.max_words,
            distinct_tokens: vocab.distinct_tokens,
            tokens: vocab.tokens,
            counts: vocab.counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(raw: &[&str]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|d| d.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn ranks_by_frequency_then_first_seen() {
        let corpus = docs(&["b a c", "c a", "d c"]);
        let vocab = Vocabulary::fit(&corpus, 100);

        assert_eq!(vocab.id("c"), Some(1)); // 3 occurrences
        assert_eq!(vocab.id("a"), Some(2)); // 2 occurrences
        assert_eq!(vocab.id("b"), Some(3)); // 1, seen before d
        assert_eq!(vocab.id("d"), Some(4));
        assert_eq!(vocab.count(1), Some(3));
    }

    #[test]
    fn ids_are_dense_from_one() {
        let corpus = docs(&["one two three two", "four five one", "six"]);
        let vocab = Vocabulary::fit(&corpus, 100);

        let mut ids: Vec<u32> = vocab.iter().map(|(id, _)| id).collect();
        ids.sort_unstable();
        let expected: Vec<u32> = (1..=vocab.len() as u32).collect();
        assert_eq!(ids, expected);
        assert!(vocab.id("").is_none());
        assert_eq!(vocab.token(PAD_ID), None);
        assert_eq!(vocab.num_rows(), vocab.len() + 1);
    }

    #[test]
    fn cap_excludes_low_ranked_tokens() {
        let corpus = docs(&["a a a b b c d"]);
        let vocab = Vocabulary::fit(&corpus, 3);

        // ids stay strictly below the cap
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.id("a"), Some(1));
        assert_eq!(vocab.id("b"), Some(2));
        assert_eq!(vocab.id("c"), None);
        assert_eq!(vocab.id("d"), None);

        let report = vocab.report();
        assert_eq!(report.distinct_tokens, 4);
        assert_eq!(report.assigned, 2);
        assert_eq!(report.dropped, 2);
    }

    #[test]
    fn ids_skip_out_of_vocabulary_tokens() {
        let corpus = docs(&["love cats", "hate cats"]);
        let vocab = Vocabulary::fit(&corpus, 100);
        let ids = vocab.ids(&["cats", "are", "great", "love"]);
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(vocab.decode(&[0, 0, 1, 2]), vec!["cats", "love"]);
    }

    #[test]
    fn empty_corpus_yields_empty_vocabulary() {
        let corpus: Vec<Vec<String>> = Vec::new();
        let vocab = Vocabulary::fit(&corpus, 100);
        assert!(vocab.is_empty());
        assert_eq!(vocab.num_rows(), 1);
        assert_eq!(vocab.report().distinct_tokens, 0);
    }

    #[test]
    fn zero_cap_assigns_nothing() {
        let corpus = docs(&["a b"]);
        let vocab = Vocabulary::fit(&corpus, 0);
        assert!(vocab.is_empty());
        assert_eq!(vocab.distinct_tokens(), 2);
    }

    #[test]
    fn serialization_roundtrip_rebuilds_index() {
        let corpus = docs(&["x y y z z z"]);
        let vocab = Vocabulary::fit(&corpus, 10);

        let json = serde_json::to_string(&vocab).unwrap();
        let back: Vocabulary = serde_json::from_str(&json).unwrap();

        assert_eq!(back, vocab);
        assert_eq!(back.id("z"), Some(1));
        assert_eq!(back.token(3), Some("x"));
    }
}
