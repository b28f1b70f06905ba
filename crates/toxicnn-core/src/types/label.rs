use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of toxicity categories predicted per comment.
pub const NUM_LABELS: usize = 6;

/// Column names of the six categories, in output order.
pub const LABEL_NAMES: [&str; NUM_LABELS] = [
    "toxic",
    "severe_toxic",
    "obscene",
    "threat",
    "insult",
    "identity_hate",
];

/// One of the six overlapping toxicity categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Rude, disrespectful or unreasonable.
    Toxic,
    /// Very hateful, aggressive or disrespectful.
    SevereToxic,
    /// Swearing, cursing or profanity.
    Obscene,
    /// Intent to inflict pain, injury or violence.
    Threat,
    /// Insulting or inflammatory toward a person.
    Insult,
    /// Hate directed at an identity such as religion, race or sexuality.
    IdentityHate,
}

impl Label {
    /// All labels in output column order.
    pub const ALL: [Label; NUM_LABELS] = [
        Self::Toxic,
        Self::SevereToxic,
        Self::Obscene,
        Self::Threat,
        Self::Insult,
        Self::IdentityHate,
    ];

    /// Column index of this label in label vectors and model outputs.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name used in the data and submission files.
    #[must_use]
    pub fn name(self) -> &'static str {
        LABEL_NAMES[self.index()]
    }

    /// Returns the label at column `index`, if any.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|label| label.name() == s)
            .ok_or_else(|| format!("unknown label {s:?}"))
    }
}

/// Target values for the six categories of one comment.
///
/// Values are 0.0 or 1.0 in the training data; categories are independent,
/// so any number of them may be set at once.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelSet(pub [f32; NUM_LABELS]);

impl LabelSet {
    /// A label set with no category active.
    #[must_use]
    pub fn clean() -> Self {
        Self::default()
    }

    /// Builds a label set from the categories that are active.
    #[must_use]
    pub fn from_active(active: &[Label]) -> Self {
        let mut values = [0.0; NUM_LABELS];
        for label in active {
            values[label.index()] = 1.0;
        }
        Self(values)
    }

    /// Value for a single category.
    #[must_use]
    pub fn get(&self, label: Label) -> f32 {
        self.0[label.index()]
    }

    /// Returns `true` if the category is active (value >= 0.5).
    #[must_use]
    pub fn is_active(&self, label: Label) -> bool {
        self.get(label) >= 0.5
    }

    /// Raw values in column order.
    #[must_use]
    pub fn as_array(&self) -> &[f32; NUM_LABELS] {
        &self.0
    }
}
