pub mod comment;
pub mod label;

pub use comment::{Comment, MISSING_TEXT_PLACEHOLDER};
pub use label::{Label, LabelSet, LABEL_NAMES, NUM_LABELS};
