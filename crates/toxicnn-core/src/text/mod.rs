pub mod sequence;
pub mod stopwords;
pub mod tokenizer;
pub mod vocab;

pub use sequence::{EncodedSequences, LengthStats, SequenceEncoder, Side};
pub use tokenizer::CommentTokenizer;
pub use vocab::{PAD_ID, Vocabulary, VocabularyBuilder, VocabularyReport};
