//! Mini-batch training loop with held-out validation and early stopping.

use candle_core::{Device, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW};

use crate::error::{Result, ToxicnnError};
use crate::model::{ToxicityCnn, binary_cross_entropy_with_logits, correct_predictions};
use crate::rng::{self, Stream};
use crate::text::EncodedSequences;
use crate::train::config::TrainConfig;
use crate::train::early_stopping::EarlyStopping;
use crate::train::history::{EpochMetrics, StopReason, TrainingHistory};
use crate::train::split::ValidationSplit;
use crate::types::{LabelSet, NUM_LABELS};

/// Result of [`Trainer::fit`].
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Per-epoch metrics and the stop reason.
    pub history: TrainingHistory,
    /// The split used in the last epoch.
    pub split: ValidationSplit,
}

/// Fits a [`ToxicityCnn`] with Adam on binary cross-entropy.
pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    /// Create a trainer.
    ///
    /// # Errors
    ///
    /// Returns `ToxicnnError::InvalidConfig` if `config` does not validate.
    pub fn new(config: TrainConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The training configuration.
    #[must_use]
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Train `model` on `sequences` and their `labels`.
    ///
    /// The model's variables are updated in place. Training ends after
    /// `epochs` epochs or when the validation loss stops improving.
    ///
    /// # Errors
    ///
    /// - `ShapeMismatch` if `labels` or the sequence length disagree with the
    ///   inputs or the model.
    /// - `InvalidConfig` if the split leaves no example to train on.
    /// - `TrainingDiverged` if a training or validation loss is not finite.
    pub fn fit(
        &self,
        model: &mut ToxicityCnn,
        sequences: &EncodedSequences,
        labels: &[LabelSet],
    ) -> Result<TrainingOutcome> {
        let n = sequences.rows();
        if n == 0 {
            return Err(ToxicnnError::EmptyCorpus);
        }
        if labels.len() != n {
            return Err(ToxicnnError::ShapeMismatch(format!(
                "{n} sequences but {} label rows",
                labels.len()
            )));
        }
        if sequences.max_len() != model.max_seq_len() {
            return Err(ToxicnnError::ShapeMismatch(format!(
                "sequences have length {}, model expects {}",
                sequences.max_len(),
                model.max_seq_len()
            )));
        }

        let cfg = &self.config;
        let device = model.device().clone();
        let inputs = sequences.to_tensor(&device)?;
        let targets = labels_to_tensor(labels, &device)?;

        let mut optimizer = AdamW::new(
            model.vars(),
            ParamsAdamW {
                lr: cfg.learning_rate,
                beta1: cfg.beta1,
                beta2: cfg.beta2,
                eps: cfg.epsilon,
                weight_decay: 0.0,
            },
        )?;

        let mut split_rng = rng::stream(cfg.seed, Stream::Split);
        let mut shuffle_rng = rng::stream(cfg.seed, Stream::Shuffle);
        let mut dropout_rng = rng::stream(cfg.seed, Stream::Dropout);

        let mut split = ValidationSplit::new(n, cfg.validation_split, &mut split_rng);
        if split.train.is_empty() {
            return Err(ToxicnnError::InvalidConfig(format!(
                "validation_split {} leaves no training examples out of {n}",
                cfg.validation_split
            )));
        }

        let mut stopper = EarlyStopping::new(cfg.patience, cfg.min_delta);
        let mut epochs = Vec::with_capacity(cfg.epochs);
        let mut stop_reason = StopReason::EpochCap;

        tracing::info!(
            train = split.train.len(),
            validation = split.validation.len(),
            params = model.num_trainable_params(),
            "starting training"
        );

        for epoch in 1..=cfg.epochs {
            if cfg.reshuffle_split && epoch > 1 {
                split = ValidationSplit::new(n, cfg.validation_split, &mut split_rng);
            }

            let mut order = split.train.clone();
            if cfg.shuffle {
                rng::shuffle(&mut order, &mut shuffle_rng);
            }

            let mut loss_sum = 0.0f64;
            let mut correct = 0.0f64;
            for (batch, chunk) in order.chunks(cfg.batch_size).enumerate() {
                let (x, y) = gather(&inputs, &targets, chunk, &device)?;
                let logits = model.forward(&x, Some(&mut dropout_rng))?;
                let bce = binary_cross_entropy_with_logits(&logits, &y)?;
                let loss = (bce + model.l2_penalty()?)?;
                let value = finite_loss(loss.to_scalar::<f32>()?, epoch, batch)?;

                optimizer.backward_step(&loss)?;

                loss_sum += value * chunk.len() as f64;
                correct += correct_predictions(&logits, &y)?;
                tracing::debug!(epoch, batch, loss = value, "batch complete");
            }

            let seen = order.len() as f64;
            let loss = loss_sum / seen;
            let accuracy = correct / (seen * NUM_LABELS as f64);

            let validation = if split.has_validation() {
                Some(evaluate(
                    model,
                    &inputs,
                    &targets,
                    &split.validation,
                    cfg.batch_size,
                    epoch,
                )?)
            } else {
                None
            };
            let val_loss = validation.map(|(l, _)| l);
            let val_accuracy = validation.map(|(_, a)| a);

            tracing::info!(
                epoch,
                loss,
                accuracy,
                val_loss = ?val_loss,
                val_accuracy = ?val_accuracy,
                "epoch complete"
            );
            epochs.push(EpochMetrics {
                epoch,
                loss,
                accuracy,
                val_loss,
                val_accuracy,
            });

            if let Some(val_loss) = val_loss {
                if stopper.update(val_loss) {
                    tracing::info!(
                        epoch,
                        best_val_loss = stopper.best(),
                        patience = cfg.patience,
                        "validation loss stopped improving"
                    );
                    stop_reason = StopReason::EarlyStopped { epoch };
                    break;
                }
            }
        }

        Ok(TrainingOutcome {
            history: TrainingHistory {
                epochs,
                stop_reason,
            },
            split,
        })
    }
}

/// `[n, 6]` f32 target tensor.
fn labels_to_tensor(labels: &[LabelSet], device: &Device) -> Result<Tensor> {
    let flat: Vec<f32> = labels.iter().flat_map(|l| *l.as_array()).collect();
    Ok(Tensor::from_vec(flat, (labels.len(), NUM_LABELS), device)?)
}

fn gather(
    inputs: &Tensor,
    targets: &Tensor,
    rows: &[usize],
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let index: Vec<u32> = rows.iter().map(|&r| r as u32).collect();
    let index = Tensor::from_vec(index, rows.len(), device)?;
    Ok((inputs.index_select(&index, 0)?, targets.index_select(&index, 0)?))
}

/// Mean loss and accuracy over `rows`, dropout disabled.
fn evaluate(
    model: &ToxicityCnn,
    inputs: &Tensor,
    targets: &Tensor,
    rows: &[usize],
    batch_size: usize,
    epoch: usize,
) -> Result<(f64, f64)> {
    let device = model.device();
    let penalty = f64::from(model.l2_penalty()?.to_scalar::<f32>()?);
    let mut loss_sum = 0.0f64;
    let mut correct = 0.0f64;

    for (batch, chunk) in rows.chunks(batch_size).enumerate() {
        let (x, y) = gather(inputs, targets, chunk, device)?;
        let logits = model.forward(&x, None)?;
        let bce = binary_cross_entropy_with_logits(&logits, &y)?.to_scalar::<f32>()?;
        let value = finite_loss(bce, epoch, batch)? + penalty;
        loss_sum += value * chunk.len() as f64;
        correct += correct_predictions(&logits, &y)?;
    }

    let seen = rows.len() as f64;
    Ok((loss_sum / seen, correct / (seen * NUM_LABELS as f64)))
}

fn finite_loss(value: f32, epoch: usize, batch: usize) -> Result<f64> {
    if value.is_finite() {
        Ok(f64::from(value))
    } else {
        Err(ToxicnnError::TrainingDiverged { epoch, batch })
    }
}
