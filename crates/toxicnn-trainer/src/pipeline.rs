//! The end-to-end job: load, preprocess, align, train, predict, save.

use std::fs::{self, File};
use std::io::BufWriter;

use anyhow::{Context, Result, bail};
use candle_core::Device;
use serde::Serialize;
use toxicnn_core::PipelineConfig;
use toxicnn_core::embedding::{EmbeddingIndex, EmbeddingMatrix};
use toxicnn_core::eval::{ColumnAuc, column_auc};
use toxicnn_core::model::{LayerSummary, ModelConfig, ToxicityCnn};
use toxicnn_core::predict::{Predictions, Predictor};
use toxicnn_core::prepare::{PreprocessReport, TextPipeline, prepare};
use toxicnn_core::train::{Trainer, TrainingHistory};
use toxicnn_core::types::{Comment, LabelSet};

use crate::config::RunConfig;
use crate::{data, embeddings, submission};

/// Embedding coverage of the vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingSummary {
    /// Vectors in the pretrained file.
    pub vectors: usize,
    /// Rows of the embedding matrix, padding row included.
    pub nb_words: usize,
    /// Vector width.
    pub dim: usize,
    /// Vocabulary tokens with a pretrained vector.
    pub found: usize,
    /// Vocabulary tokens without one.
    pub not_found: usize,
    /// All-zero matrix rows, padding row included.
    pub zero_rows: usize,
    /// `found / (found + not_found)`.
    pub coverage: f64,
    /// Seeded sample of tokens without a vector.
    pub not_found_sample: Vec<String>,
}

/// Architecture of the trained model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    /// Architecture settings.
    pub config: ModelConfig,
    /// Sequence length the model was trained on.
    pub max_seq_len: usize,
    /// Parameters updated by training.
    pub trainable_params: usize,
    /// Per-layer shapes and sizes.
    pub layers: Vec<LayerSummary>,
}

/// Everything a run reports, written as `report.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Seed every random stream was derived from.
    pub seed: u64,
    /// Corpus sizes, vocabulary and sequence length.
    pub preprocess: PreprocessReport,
    /// Embedding coverage.
    pub embeddings: EmbeddingSummary,
    /// Model architecture.
    pub model: ModelSummary,
    /// Per-epoch metrics.
    pub history: TrainingHistory,
    /// ROC AUC on the held-out split, when there is one.
    pub validation_auc: Option<ColumnAuc>,
}

/// In-memory results of [`train_and_predict`].
pub struct RunArtifacts {
    /// The trained model.
    pub model: ToxicityCnn,
    /// Tokenizer, vocabulary and sequence length used for encoding.
    pub text: TextPipeline,
    /// Test-set probabilities, in test order.
    pub predictions: Predictions,
    /// Diagnostics.
    pub report: RunReport,
}

/// Train on `train` and score `test` without touching the filesystem.
pub fn train_and_predict(
    train: &[Comment],
    test: &[Comment],
    index: &EmbeddingIndex,
    config: &PipelineConfig,
    not_found_sample: usize,
) -> Result<RunArtifacts> {
    config.validate()?;
    let embed_dim = config.model.embed_dim;
    if let Some(dim) = index.dim() {
        if dim != embed_dim {
            bail!("word vectors have {dim} components but the model expects {embed_dim}");
        }
    }

    let prepared = prepare(train, test, config)?;
    let report = &prepared.report;
    tracing::info!(
        train = report.train_comments,
        test = report.test_comments,
        vocabulary = report.vocabulary.assigned,
        max_seq_len = report.max_seq_len,
        "preprocessed corpus"
    );

    let (matrix, alignment) =
        EmbeddingMatrix::align(prepared.pipeline.vocabulary(), index, embed_dim)?;
    let sample: Vec<String> = alignment
        .sample_not_found(not_found_sample, config.train.seed)
        .into_iter()
        .map(str::to_string)
        .collect();
    tracing::info!(
        found = alignment.found,
        not_found = alignment.not_found.len(),
        zero_rows = alignment.zero_rows,
        "aligned embeddings"
    );
    tracing::info!(sample = ?sample, "sample words not found");
    let embeddings = EmbeddingSummary {
        vectors: index.len(),
        nb_words: alignment.nb_words,
        dim: alignment.dim,
        found: alignment.found,
        not_found: alignment.not_found.len(),
        zero_rows: alignment.zero_rows,
        coverage: alignment.coverage(),
        not_found_sample: sample,
    };

    let max_seq_len = prepared.report.max_seq_len;
    let mut model = ToxicityCnn::new(
        config.model.clone(),
        max_seq_len,
        &matrix,
        config.train.seed,
        &Device::Cpu,
    )?;
    for layer in model.summary() {
        tracing::debug!(
            layer = layer.name,
            output_shape = ?layer.output_shape,
            params = layer.params,
            trainable = layer.trainable,
            "model layer"
        );
    }

    let trainer = Trainer::new(config.train.clone())?;
    let outcome = trainer.fit(&mut model, &prepared.train, &prepared.train_labels)?;
    tracing::info!(
        epochs = outcome.history.len(),
        stop = %outcome.history.stop_reason,
        "training finished"
    );

    let predictor = Predictor::new(&model, config.train.batch_size);
    let validation_auc = if outcome.split.has_validation() {
        let rows = &outcome.split.validation;
        let held_out = prepared.train.select(rows);
        let truth: Vec<LabelSet> = rows.iter().map(|&i| prepared.train_labels[i]).collect();
        let scores = predictor.predict(&held_out)?;
        let auc = column_auc(scores.rows(), &truth)?;
        tracing::info!(mean_auc = ?auc.mean, "validation ROC AUC");
        Some(auc)
    } else {
        None
    };

    let predictions = predictor.predict(&prepared.test)?;

    let report = RunReport {
        seed: config.train.seed,
        preprocess: prepared.report,
        embeddings,
        model: ModelSummary {
            config: config.model.clone(),
            max_seq_len,
            trainable_params: model.num_trainable_params(),
            layers: model.summary(),
        },
        history: outcome.history,
        validation_auc,
    };

    Ok(RunArtifacts {
        model,
        text: prepared.pipeline,
        predictions,
        report,
    })
}

/// Run the full job described by `config` and write its outputs.
pub fn run(config: &RunConfig) -> Result<RunReport> {
    let train = data::load_train(&config.train_path)?;
    let test = data::load_test(&config.test_path)?;
    let index = embeddings::load_vec(&config.embeddings_path)?;

    let artifacts = train_and_predict(
        &train,
        &test,
        &index,
        &config.pipeline,
        config.not_found_sample,
    )?;

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("cannot create {}", config.output_dir.display()))?;

    artifacts.model.save(config.model_path())?;
    write_json(&config.vocab_path(), artifacts.text.vocabulary())?;
    let ids: Vec<String> = test.iter().map(|c| c.id.clone()).collect();
    submission::save_submission(config.submission_path(), &ids, &artifacts.predictions)?;
    write_json(&config.report_path(), &artifacts.report)?;

    tracing::info!(output_dir = %config.output_dir.display(), "run complete");
    Ok(artifacts.report)
}

fn write_json<T: Serialize + ?Sized>(path: &std::path::Path, value: &T) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}
