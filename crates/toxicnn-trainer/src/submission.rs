//! Submission files: one row of per-label probabilities per test comment.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result, ensure};
use toxicnn_core::predict::Predictions;
use toxicnn_core::types::{LABEL_NAMES, NUM_LABELS};

/// Write `id` plus the six label columns for every prediction row.
pub fn write_submission<W: Write>(
    writer: W,
    ids: &[String],
    predictions: &Predictions,
) -> Result<()> {
    ensure!(
        ids.len() == predictions.len(),
        "{} ids but {} prediction rows",
        ids.len(),
        predictions.len()
    );

    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = Vec::with_capacity(NUM_LABELS + 1);
    header.push("id");
    header.extend(LABEL_NAMES);
    wtr.write_record(&header)?;

    for (id, row) in ids.iter().zip(predictions.iter()) {
        let mut record = Vec::with_capacity(NUM_LABELS + 1);
        record.push(id.clone());
        record.extend(row.iter().map(|p| p.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a submission file at `path`.
pub fn save_submission<P: AsRef<Path>>(
    path: P,
    ids: &[String],
    predictions: &Predictions,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("cannot create submission {}", path.display()))?;
    write_submission(BufWriter::new(file), ids, predictions)?;
    tracing::info!(path = %path.display(), rows = ids.len(), "wrote submission");
    Ok(())
}

/// Read a submission back as ids and probability rows.
///
/// Label columns are located by name, so their order in the file does not
/// matter.
pub fn read_submission<R: Read>(reader: R) -> Result<(Vec<String>, Predictions)> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("submission has no {name:?} column"))
    };
    let id_col = column("id")?;
    let label_cols = LABEL_NAMES
        .iter()
        .map(|name| column(name))
        .collect::<Result<Vec<_>>>()?;

    let mut ids = Vec::new();
    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = i + 2;
        let field = |col: usize| record.get(col).unwrap_or_default();
        let mut row = [0.0f32; NUM_LABELS];
        for (slot, &col) in row.iter_mut().zip(&label_cols) {
            *slot = field(col)
                .trim()
                .parse()
                .with_context(|| format!("line {line}: {:?} is not a probability", field(col)))?;
        }
        ids.push(field(id_col).to_string());
        rows.push(row);
    }
    Ok((ids, Predictions::from_rows(rows)))
}
