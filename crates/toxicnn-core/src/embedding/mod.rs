pub mod index;
pub mod matrix;

pub use index::EmbeddingIndex;
pub use matrix::{AlignmentReport, DEFAULT_EMBED_DIM, EmbeddingMatrix};
