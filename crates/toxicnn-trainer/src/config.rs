use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use toxicnn_core::PipelineConfig;

/// Inputs, outputs and settings of one training job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Labeled CSV.
    pub train_path: PathBuf,
    /// Unlabeled CSV to score.
    pub test_path: PathBuf,
    /// fastText `.vec` file.
    pub embeddings_path: PathBuf,
    /// Directory receiving the model, vocabulary, report and submission.
    pub output_dir: PathBuf,
    /// How many not-found words to list in the report.
    pub not_found_sample: usize,
    /// Preprocessing, model and training settings.
    pub pipeline: PipelineConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            train_path: PathBuf::from("data/train.csv"),
            test_path: PathBuf::from("data/test.csv"),
            embeddings_path: PathBuf::from("data/wiki.en.vec"),
            output_dir: PathBuf::from("output"),
            not_found_sample: 10,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl RunConfig {
    /// Parse a JSON config; absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid run config")
    }

    /// Load a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }

    /// Path of the saved model weights.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.output_dir.join("model.safetensors")
    }

    /// Path of the saved vocabulary.
    #[must_use]
    pub fn vocab_path(&self) -> PathBuf {
        self.output_dir.join("vocab.json")
    }

    /// Path of the run report.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join("report.json")
    }

    /// Path of the submission file.
    #[must_use]
    pub fn submission_path(&self) -> PathBuf {
        self.output_dir.join("submission.csv")
    }
}
