//! CSV loading for labeled training comments and unlabeled test comments.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use toxicnn_core::types::{Comment, LabelSet};

#[derive(Debug, Deserialize)]
struct TrainRecord {
    id: String,
    comment_text: Option<String>,
    toxic: f32,
    severe_toxic: f32,
    obscene: f32,
    threat: f32,
    insult: f32,
    identity_hate: f32,
}

#[derive(Debug, Deserialize)]
struct TestRecord {
    id: String,
    comment_text: Option<String>,
}

/// Read labeled comments from CSV with a header row.
///
/// Columns are matched by name, so extra columns are ignored. Empty comment
/// text becomes the missing-text placeholder.
pub fn read_train<R: Read>(reader: R) -> Result<Vec<Comment>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut comments = Vec::new();
    for record in rdr.deserialize() {
        let r: TrainRecord = record.context("malformed training row")?;
        let labels = LabelSet([
            r.toxic,
            r.severe_toxic,
            r.obscene,
            r.threat,
            r.insult,
            r.identity_hate,
        ]);
        comments.push(Comment::labeled(
            r.id,
            r.comment_text.unwrap_or_default(),
            labels,
        ));
    }
    Ok(comments)
}

/// Read unlabeled comments from CSV with a header row.
pub fn read_test<R: Read>(reader: R) -> Result<Vec<Comment>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut comments = Vec::new();
    for record in rdr.deserialize() {
        let r: TestRecord = record.context("malformed test row")?;
        comments.push(Comment::unlabeled(r.id, r.comment_text.unwrap_or_default()));
    }
    Ok(comments)
}

/// Load the training file at `path`.
pub fn load_train<P: AsRef<Path>>(path: P) -> Result<Vec<Comment>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("cannot open training data {}", path.display()))?;
    let comments = read_train(BufReader::new(file))
        .with_context(|| format!("failed to read {}", path.display()))?;
    tracing::info!(path = %path.display(), comments = comments.len(), "loaded training comments");
    Ok(comments)
}

/// Load the test file at `path`.
pub fn load_test<P: AsRef<Path>>(path: P) -> Result<Vec<Comment>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("cannot open test data {}", path.display()))?;
    let comments = read_test(BufReader::new(file))
        .with_context(|| format!("failed to read {}", path.display()))?;
    tracing::info!(path = %path.display(), comments = comments.len(), "loaded test comments");
    Ok(comments)
}
