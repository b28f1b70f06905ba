//! Scores a submission file against ground-truth labels with mean
//! column-wise ROC AUC and prints the result as JSON.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::{Deserialize, Serialize};
use toxicnn_core::eval::{ColumnAuc, column_auc};
use toxicnn_core::types::{LabelSet, NUM_LABELS};
use toxicnn_trainer::submission::read_submission;

#[derive(Parser, Debug)]
#[command(name = "toxicnn-score")]
#[command(about = "Mean column-wise ROC AUC of a submission")]
struct Cli {
    /// CSV with `id` and the six label columns
    #[arg(short, long)]
    labels: PathBuf,

    /// Submission CSV to score
    #[arg(short, long)]
    submission: PathBuf,

    /// Single-line JSON output
    #[arg(long)]
    compact: bool,
}

#[derive(Debug, Deserialize)]
struct TruthRecord {
    id: String,
    toxic: f32,
    severe_toxic: f32,
    obscene: f32,
    threat: f32,
    insult: f32,
    identity_hate: f32,
}

#[derive(Debug, Serialize)]
struct ScoreOutput {
    scored: usize,
    skipped: usize,
    #[serde(flatten)]
    auc: ColumnAuc,
}

/// Ground truth keyed by id. Rows carrying a negative label are
/// unscored and returned only as a count.
fn read_truth<R: Read>(reader: R) -> Result<(HashMap<String, LabelSet>, usize)> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut truth = HashMap::new();
    let mut skipped = 0;
    for record in rdr.deserialize() {
        let r: TruthRecord = record.context("malformed label row")?;
        let values: [f32; NUM_LABELS] = [
            r.toxic,
            r.severe_toxic,
            r.obscene,
            r.threat,
            r.insult,
            r.identity_hate,
        ];
        if values.iter().any(|&v| v < 0.0) {
            skipped += 1;
            continue;
        }
        truth.insert(r.id, LabelSet(values));
    }
    Ok((truth, skipped))
}

fn score<R1: Read, R2: Read>(labels: R1, submission: R2) -> Result<ScoreOutput> {
    let (truth, skipped) = read_truth(labels)?;
    let (ids, predictions) = read_submission(submission)?;

    let mut scores = Vec::with_capacity(truth.len());
    let mut targets = Vec::with_capacity(truth.len());
    for (id, row) in ids.iter().zip(predictions.iter()) {
        if let Some(labels) = truth.get(id) {
            scores.push(*row);
            targets.push(*labels);
        }
    }

    if scores.len() != truth.len() {
        bail!(
            "submission covers {} of {} scored ids",
            scores.len(),
            truth.len()
        );
    }

    let auc = column_auc(&scores, &targets)?;
    Ok(ScoreOutput {
        scored: scores.len(),
        skipped,
        auc,
    })
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = score(open(&cli.labels)?, open(&cli.submission)?)?;
    let json = if cli.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{json}");
    Ok(())
}
