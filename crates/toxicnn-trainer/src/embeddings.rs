//! Reader for fastText `.vec` text embeddings.
//!
//! Each line is a token followed by space-separated components. Only ASCII
//! spaces separate fields, so tokens may contain other whitespace such as
//! U+00A0. The first line may be a `count dim` header, which is skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, bail};
use toxicnn_core::embedding::EmbeddingIndex;

/// Read every vector from `reader`.
///
/// # Errors
///
/// Fails on I/O errors, on a component that is not a float, and on a vector
/// whose width differs from the first one. Errors name the 1-based line.
pub fn read_vec<R: BufRead>(reader: R) -> Result<EmbeddingIndex> {
    let mut index = EmbeddingIndex::new();
    let mut first = true;

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.with_context(|| format!("cannot read line {line_no}"))?;
        let mut parts = line.trim_end().split(' ').filter(|p| !p.is_empty());
        let Some(token) = parts.next() else {
            continue;
        };
        let rest: Vec<&str> = parts.collect();

        if std::mem::take(&mut first) && is_header(token, &rest) {
            tracing::debug!(header = %line.trim(), "skipping embedding header");
            continue;
        }

        let mut vector = Vec::with_capacity(rest.len());
        for component in rest {
            match component.parse::<f32>() {
                Ok(v) => vector.push(v),
                Err(_) => bail!("line {line_no}: {component:?} is not a number"),
            }
        }
        index
            .insert(token, vector)
            .with_context(|| format!("line {line_no}"))?;
    }

    Ok(index)
}

fn is_header(first: &str, rest: &[&str]) -> bool {
    rest.len() == 1 && first.parse::<usize>().is_ok() && rest[0].parse::<usize>().is_ok()
}

/// Load the embedding file at `path`.
pub fn load_vec<P: AsRef<Path>>(path: P) -> Result<EmbeddingIndex> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("cannot open embeddings {}", path.display()))?;
    let index = read_vec(BufReader::new(file))
        .with_context(|| format!("failed to read {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        vectors = index.len(),
        dim = ?index.dim(),
        "loaded word vectors"
    );
    Ok(index)
}
