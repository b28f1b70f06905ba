//! # toxicnn Trainer
//!
//! File-level adapters around `toxicnn-core`: CSV comment loading, fastText
//! vector reading, the training job and the submission writer.

pub mod config;
pub mod data;
pub mod embeddings;
pub mod pipeline;
pub mod submission;

pub use config::RunConfig;
pub use pipeline::{RunArtifacts, RunReport, run, train_and_predict};

/// Run the training job described by `config`, writing every output into its
/// output directory.
pub fn run_training(config: &RunConfig) -> anyhow::Result<RunReport> {
    tracing::info!(
        train = %config.train_path.display(),
        test = %config.test_path.display(),
        embeddings = %config.embeddings_path.display(),
        "starting training run"
    );
    run(config)
}
