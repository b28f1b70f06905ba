use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use toxicnn_trainer::{RunConfig, run_training};

/// Train the toxic comment classifier and write a submission.
#[derive(Parser)]
#[command(name = "train")]
#[command(about = "Train the convolutional toxicity classifier")]
#[command(version)]
struct Cli {
    /// JSON run config; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Labeled training CSV
    #[arg(long)]
    train: Option<PathBuf>,

    /// Unlabeled test CSV
    #[arg(long)]
    test: Option<PathBuf>,

    /// fastText .vec word vectors
    #[arg(long)]
    embeddings: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Maximum number of epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// Batch size
    #[arg(long)]
    batch_size: Option<usize>,

    /// Adam learning rate
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Vocabulary cap
    #[arg(long)]
    max_words: Option<usize>,

    /// Pin the sequence length instead of deriving it
    #[arg(long)]
    max_seq_len: Option<usize>,

    /// Seed for initialisation, splitting, shuffling and dropout
    #[arg(long)]
    seed: Option<u64>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        if let Some(path) = self.train {
            config.train_path = path;
        }
        if let Some(path) = self.test {
            config.test_path = path;
        }
        if let Some(path) = self.embeddings {
            config.embeddings_path = path;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }

        let pipeline = &mut config.pipeline;
        if let Some(epochs) = self.epochs {
            pipeline.train.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            pipeline.train.batch_size = batch_size;
        }
        if let Some(lr) = self.learning_rate {
            pipeline.train.learning_rate = lr;
        }
        if let Some(seed) = self.seed {
            pipeline.train.seed = seed;
        }
        if let Some(max_words) = self.max_words {
            pipeline.vocab.max_words = max_words;
        }
        if let Some(len) = self.max_seq_len {
            pipeline.max_seq_len = Some(len);
        }
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let result = cli.into_config().and_then(|config| run_training(&config));
    match result {
        Ok(report) => {
            if let Some(auc) = report.validation_auc.and_then(|a| a.mean) {
                println!("validation mean ROC AUC: {auc:.4}");
            }
            println!("{}", report.history.stop_reason);
        }
        Err(e) => {
            eprintln!("Training failed: {e:#}");
            std::process::exit(1);
        }
    }
}
