//! # Convolutional Toxicity Classifier
//!
//! Frozen pretrained embeddings followed by two same-padded convolutions, a
//! global max-pool and a small dense head with one sigmoid output per label.
//!
//! ```text
//! ids [b, L] -> embedding [b, L, E] -> conv(k=7, F) + relu -> maxpool(2)
//!            -> conv(k=7, F) + relu -> global maxpool [b, F] -> dropout
//!            -> dense(32) + relu -> dense(6) -> sigmoid
//! ```

use std::collections::HashMap;
use std::path::Path;

use candle_core::{D, DType, Device, Tensor, Var};
use candle_nn::{Conv1d, Conv1dConfig, Embedding, Linear, Module};
use oorandom::Rand32;
use serde::Serialize;

use crate::embedding::EmbeddingMatrix;
use crate::error::{Result, ToxicnnError};
use crate::model::config::ModelConfig;
use crate::model::init;
use crate::rng::{self, Stream};
use crate::types::NUM_LABELS;

const EMBEDDING_KEY: &str = "embedding.weight";

/// Trainable parameter names, in optimizer order.
pub const PARAM_NAMES: [&str; 8] = [
    "conv1.weight",
    "conv1.bias",
    "conv2.weight",
    "conv2.bias",
    "hidden.weight",
    "hidden.bias",
    "output.weight",
    "output.bias",
];

/// One row of the layer summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerSummary {
    /// Layer name.
    pub name: &'static str,
    /// Output shape, batch dimension omitted.
    pub output_shape: Vec<usize>,
    /// Parameter count.
    pub params: usize,
    /// Whether gradient descent updates the parameters.
    pub trainable: bool,
}

/// The convolutional multi-label classifier.
///
/// The embedding table is a plain tensor, not a variable, so it never
/// receives gradient updates. Every other parameter is a [`Var`] owned by the
/// model and updated in place by the optimizer.
pub struct ToxicityCnn {
    config: ModelConfig,
    max_seq_len: usize,
    embedding: Embedding,
    conv1: Conv1d,
    conv2: Conv1d,
    hidden: Linear,
    output: Linear,
    params: Vec<(String, Var)>,
}

impl ToxicityCnn {
    /// Build a freshly initialised model around a pretrained embedding matrix.
    ///
    /// Kernels use Glorot-uniform initialisation drawn from the `seed`'s
    /// initialisation stream; biases start at zero.
    ///
    /// # Errors
    ///
    /// Returns `ToxicnnError::InvalidConfig` if the configuration does not fit
    /// `max_seq_len` or the matrix width differs from `config.embed_dim`.
    pub fn new(
        config: ModelConfig,
        max_seq_len: usize,
        embeddings: &EmbeddingMatrix,
        seed: u64,
        device: &Device,
    ) -> Result<Self> {
        config.validate(max_seq_len)?;
        if embeddings.dim() != config.embed_dim {
            return Err(ToxicnnError::InvalidConfig(format!(
                "embedding matrix width {} does not match embed_dim {}",
                embeddings.dim(),
                config.embed_dim
            )));
        }

        let mut rng = rng::stream(seed, Stream::Init);
        let params = init_params(&config, &mut rng, device)?;
        let table = embeddings.to_tensor(device)?;
        Self::assemble(config, max_seq_len, table, params)
    }

    fn assemble(
        config: ModelConfig,
        max_seq_len: usize,
        table: Tensor,
        params: Vec<(String, Var)>,
    ) -> Result<Self> {
        let tensor = |name: &str| -> Result<Tensor> {
            params
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_tensor().clone())
                .ok_or_else(|| ToxicnnError::ModelLoad(format!("missing parameter {name}")))
        };
        let conv_config = Conv1dConfig::default();

        let embedding = Embedding::new(table, config.embed_dim);
        let conv1 = Conv1d::new(
            tensor("conv1.weight")?,
            Some(tensor("conv1.bias")?),
            conv_config,
        );
        let conv2 = Conv1d::new(
            tensor("conv2.weight")?,
            Some(tensor("conv2.bias")?),
            conv_config,
        );
        let hidden = Linear::new(tensor("hidden.weight")?, Some(tensor("hidden.bias")?));
        let output = Linear::new(tensor("output.weight")?, Some(tensor("output.bias")?));

        Ok(Self {
            config,
            max_seq_len,
            embedding,
            conv1,
            conv2,
            hidden,
            output,
            params,
        })
    }

    /// Forward pass producing logits of shape `[batch, 6]`.
    ///
    /// Dropout is applied only when `dropout_rng` is given, which is how the
    /// training loop selects training mode.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        dropout_rng: Option<&mut Rand32>,
    ) -> candle_core::Result<Tensor> {
        let x = self.embedding.forward(input_ids)?;
        // conv1d expects [batch, channels, length]
        let x = x.transpose(1, 2)?.contiguous()?;
        let pad = self.config.same_padding();
        let x = self.conv1.forward(&x.pad_with_zeros(2, pad, pad)?)?.relu()?;
        let x = max_pool1d(&x, self.config.pool_size)?;
        let x = self.conv2.forward(&x.pad_with_zeros(2, pad, pad)?)?.relu()?;
        let x = x.max(D::Minus1)?;
        let x = match dropout_rng {
            Some(rng) => dropout(&x, self.config.dropout, rng)?,
            None => x,
        };
        let x = self.hidden.forward(&x)?.relu()?;
        self.output.forward(&x)
    }

    /// Per-label probabilities of shape `[batch, 6]`, dropout disabled.
    pub fn predict_proba(&self, input_ids: &Tensor) -> Result<Tensor> {
        let logits = self.forward(input_ids, None)?;
        Ok(candle_nn::ops::sigmoid(&logits)?)
    }

    /// L2 penalty on the hidden dense kernel, scaled by the weight decay.
    pub fn l2_penalty(&self) -> candle_core::Result<Tensor> {
        self.hidden
            .weight()
            .sqr()?
            .sum_all()?
            .affine(self.config.weight_decay, 0.0)
    }

    /// Trainable variables, in optimizer order.
    #[must_use]
    pub fn vars(&self) -> Vec<Var> {
        self.params.iter().map(|(_, v)| v.clone()).collect()
    }

    /// The model configuration.
    #[must_use]
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Sequence length the model was built for.
    #[must_use]
    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    /// Device the parameters live on.
    #[must_use]
    pub fn device(&self) -> &Device {
        self.embedding.embeddings().device()
    }

    /// Per-layer output shapes and parameter counts.
    #[must_use]
    pub fn summary(&self) -> Vec<LayerSummary> {
        let c = &self.config;
        let l = self.max_seq_len;
        let f = c.num_filters;
        let vocab_rows = self.embedding.embeddings().dims().first().copied().unwrap_or(0);
        vec![
            LayerSummary {
                name: "embedding",
                output_shape: vec![l, c.embed_dim],
                params: vocab_rows * c.embed_dim,
                trainable: false,
            },
            LayerSummary {
                name: "conv1d_1",
                output_shape: vec![l, f],
                params: c.kernel_size * c.embed_dim * f + f,
                trainable: true,
            },
            LayerSummary {
                name: "max_pooling1d",
                output_shape: vec![l / c.pool_size, f],
                params: 0,
                trainable: false,
            },
            LayerSummary {
                name: "conv1d_2",
                output_shape: vec![l / c.pool_size, f],
                params: c.kernel_size * f * f + f,
                trainable: true,
            },
            LayerSummary {
                name: "global_max_pooling1d",
                output_shape: vec![f],
                params: 0,
                trainable: false,
            },
            LayerSummary {
                name: "dropout",
                output_shape: vec![f],
                params: 0,
                trainable: false,
            },
            LayerSummary {
                name: "dense_1",
                output_shape: vec![c.hidden_units],
                params: f * c.hidden_units + c.hidden_units,
                trainable: true,
            },
            LayerSummary {
                name: "dense_2",
                output_shape: vec![NUM_LABELS],
                params: c.hidden_units * NUM_LABELS + NUM_LABELS,
                trainable: true,
            },
        ]
    }

    /// Number of parameters updated by training.
    #[must_use]
    pub fn num_trainable_params(&self) -> usize {
        self.params.iter().map(|(_, v)| v.elem_count()).sum()
    }

    /// Save the embedding table and all trainable parameters as safetensors.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut tensors: HashMap<String, Tensor> = self
            .params
            .iter()
            .map(|(name, var)| (name.clone(), var.as_tensor().clone()))
            .collect();
        tensors.insert(
            EMBEDDING_KEY.to_string(),
            self.embedding.embeddings().clone(),
        );
        candle_core::safetensors::save(&tensors, path)?;
        Ok(())
    }

    /// Restore a model saved with [`ToxicityCnn::save`].
    ///
    /// # Errors
    ///
    /// Returns `ToxicnnError::ModelLoad` if a tensor is missing or its shape
    /// does not match `config`.
    pub fn load<P: AsRef<Path>>(
        path: P,
        config: ModelConfig,
        max_seq_len: usize,
        device: &Device,
    ) -> Result<Self> {
        config.validate(max_seq_len)?;
        let mut tensors = candle_core::safetensors::load(path, device)?;

        let table = tensors
            .remove(EMBEDDING_KEY)
            .ok_or_else(|| ToxicnnError::ModelLoad(format!("missing tensor {EMBEDDING_KEY}")))?;
        if table.rank() != 2 || table.dims()[1] != config.embed_dim {
            return Err(ToxicnnError::ModelLoad(format!(
                "embedding table has shape {:?}, expected width {}",
                table.dims(),
                config.embed_dim
            )));
        }

        let expected = param_shapes(&config);
        let mut params = Vec::with_capacity(expected.len());
        for (name, shape) in expected {
            let tensor = tensors
                .remove(name)
                .ok_or_else(|| ToxicnnError::ModelLoad(format!("missing tensor {name}")))?;
            if tensor.dims() != shape.as_slice() {
                return Err(ToxicnnError::ModelLoad(format!(
                    "{name} has shape {:?}, expected {shape:?}",
                    tensor.dims()
                )));
            }
            let tensor = tensor.to_dtype(DType::F32)?;
            params.push((name.to_string(), Var::from_tensor(&tensor)?));
        }

        Self::assemble(config, max_seq_len, table.to_dtype(DType::F32)?, params)
    }
}

fn param_shapes(c: &ModelConfig) -> Vec<(&'static str, Vec<usize>)> {
    let f = c.num_filters;
    vec![
        (PARAM_NAMES[0], vec![f, c.embed_dim, c.kernel_size]),
        (PARAM_NAMES[1], vec![f]),
        (PARAM_NAMES[2], vec![f, f, c.kernel_size]),
        (PARAM_NAMES[3], vec![f]),
        (PARAM_NAMES[4], vec![c.hidden_units, f]),
        (PARAM_NAMES[5], vec![c.hidden_units]),
        (PARAM_NAMES[6], vec![NUM_LABELS, c.hidden_units]),
        (PARAM_NAMES[7], vec![NUM_LABELS]),
    ]
}

fn init_params(
    c: &ModelConfig,
    rng: &mut Rand32,
    device: &Device,
) -> candle_core::Result<Vec<(String, Var)>> {
    let f = c.num_filters;
    let k = c.kernel_size;
    let mut params = Vec::with_capacity(PARAM_NAMES.len());
    for (name, shape) in param_shapes(c) {
        let var = match name {
            "conv1.weight" => init::glorot_uniform(shape, k * c.embed_dim, k * f, rng, device)?,
            "conv2.weight" => init::glorot_uniform(shape, k * f, k * f, rng, device)?,
            "hidden.weight" => init::glorot_uniform(shape, f, c.hidden_units, rng, device)?,
            "output.weight" => {
                init::glorot_uniform(shape, c.hidden_units, NUM_LABELS, rng, device)?
            }
            _ => init::zeros(shape, device)?,
        };
        params.push((name.to_string(), var));
    }
    Ok(params)
}

/// Non-overlapping max-pool over the last dimension; a trailing remainder
/// shorter than the window is dropped.
fn max_pool1d(x: &Tensor, size: usize) -> candle_core::Result<Tensor> {
    let (b, c, l) = x.dims3()?;
    let out = l / size;
    x.narrow(2, 0, out * size)?
        .reshape((b, c, out, size))?
        .max(D::Minus1)
}

/// Inverted dropout with a mask drawn from `rng`.
fn dropout(x: &Tensor, rate: f64, rng: &mut Rand32) -> candle_core::Result<Tensor> {
    if rate <= 0.0 {
        return Ok(x.clone());
    }
    let keep_scale = (1.0 / (1.0 - rate)) as f32;
    let mask: Vec<f32> = (0..x.elem_count())
        .map(|_| {
            if f64::from(rng.rand_float()) < rate {
                0.0
            } else {
                keep_scale
            }
        })
        .collect();
    let mask = Tensor::from_vec(mask, x.shape(), x.device())?;
    x.mul(&mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ModelConfig {
        ModelConfig::new()
            .with_embed_dim(4)
            .with_num_filters(3)
            .with_hidden_units(5)
    }

    fn matrix(rows: usize, dim: usize) -> EmbeddingMatrix {
        let mut index = crate::embedding::EmbeddingIndex::new();
        let tokens: Vec<String> = (1..rows).map(|i| format!("t{i}")).collect();
        for (i, token) in tokens.iter().enumerate() {
            let v: Vec<f32> = (0..dim).map(|d| (i * dim + d) as f32 * 0.01).collect();
            index.insert(token.clone(), v).unwrap();
        }
        let vocab = crate::text::Vocabulary::fit(&[tokens], 1000);
        EmbeddingMatrix::align(&vocab, &index, dim).unwrap().0
    }

    #[test]
    fn forward_produces_six_logits_per_comment() {
        let dev = Device::Cpu;
        let model = ToxicityCnn::new(small_config(), 9, &matrix(6, 4), 0, &dev).unwrap();
        let ids = Tensor::new(&[[0u32, 0, 0, 1, 2, 3, 4, 5, 1], [0; 9]], &dev).unwrap();

        let logits = model.forward(&ids, None).unwrap();
        assert_eq!(logits.dims(), &[2, NUM_LABELS]);

        let probs = model.predict_proba(&ids).unwrap().to_vec2::<f32>().unwrap();
        for row in probs {
            assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn sequences_shorter_than_the_kernel_backpropagate() {
        let dev = Device::Cpu;
        let model = ToxicityCnn::new(small_config(), 3, &matrix(4, 4), 0, &dev).unwrap();
        let ids = Tensor::new(&[[1u32, 2, 3], [0, 0, 1]], &dev).unwrap();

        let logits = model.forward(&ids, None).unwrap();
        assert_eq!(logits.dims(), &[2, NUM_LABELS]);
        let grads = logits.sum_all().unwrap().backward().unwrap();
        for var in model.vars() {
            let grad = grads.get(var.as_tensor()).unwrap();
            assert_eq!(grad.dims(), var.as_tensor().dims());
        }
    }

    #[test]
    fn odd_sequence_length_pools_down() {
        let dev = Device::Cpu;
        let x = Tensor::arange(0f32, 10.0, &dev).unwrap().reshape((1, 2, 5)).unwrap();
        let pooled = max_pool1d(&x, 2).unwrap();
        assert_eq!(pooled.dims(), &[1, 2, 2]);
        assert_eq!(
            pooled.to_vec3::<f32>().unwrap(),
            vec![vec![vec![1.0, 3.0], vec![6.0, 8.0]]]
        );
    }

    #[test]
    fn dropout_only_in_training_mode() {
        let dev = Device::Cpu;
        let x = Tensor::ones((4, 64), DType::F32, &dev).unwrap();
        let mut rng = Rand32::new(1);
        let dropped = dropout(&x, 0.5, &mut rng).unwrap().to_vec2::<f32>().unwrap();
        let flat: Vec<f32> = dropped.into_iter().flatten().collect();
        assert!(flat.iter().all(|&v| v == 0.0 || v == 2.0));
        assert!(flat.iter().any(|&v| v == 0.0));
        assert!(flat.iter().any(|&v| v == 2.0));

        let model = ToxicityCnn::new(small_config(), 6, &matrix(4, 4), 0, &dev).unwrap();
        let ids = Tensor::new(&[[1u32, 2, 3, 1, 2, 3]], &dev).unwrap();
        let a = model.forward(&ids, None).unwrap().to_vec2::<f32>().unwrap();
        let b = model.forward(&ids, None).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn same_seed_same_weights() {
        let dev = Device::Cpu;
        let m = matrix(4, 4);
        let a = ToxicityCnn::new(small_config(), 6, &m, 11, &dev).unwrap();
        let b = ToxicityCnn::new(small_config(), 6, &m, 11, &dev).unwrap();
        let c = ToxicityCnn::new(small_config(), 6, &m, 12, &dev).unwrap();
        let w = |m: &ToxicityCnn| {
            m.vars()[0]
                .as_tensor()
                .flatten_all()
                .unwrap()
                .to_vec1::<f32>()
                .unwrap()
        };
        assert_eq!(w(&a), w(&b));
        assert_ne!(w(&a), w(&c));
    }

    #[test]
    fn embedding_is_not_trainable() {
        let dev = Device::Cpu;
        let model = ToxicityCnn::new(small_config(), 6, &matrix(4, 4), 0, &dev).unwrap();
        assert_eq!(model.vars().len(), PARAM_NAMES.len());

        let summary = model.summary();
        assert!(!summary[0].trainable);
        assert_eq!(summary[0].params, 4 * 4);
        let trainable: usize = summary.iter().filter(|l| l.trainable).map(|l| l.params).sum();
        assert_eq!(trainable, model.num_trainable_params());
        for layer in summary.iter().filter(|l| l.params == 0) {
            assert!(!layer.trainable, "{} has no weights", layer.name);
        }
    }

    #[test]
    fn rejects_mismatched_embedding_width() {
        let dev = Device::Cpu;
        let result = ToxicityCnn::new(small_config(), 6, &matrix(4, 3), 0, &dev);
        assert!(matches!(result, Err(ToxicnnError::InvalidConfig(_))));
    }

    #[test]
    fn l2_penalty_scales_with_weight_decay() {
        let dev = Device::Cpu;
        let m = matrix(4, 4);
        let a = ToxicityCnn::new(small_config(), 6, &m, 5, &dev).unwrap();
        let b = ToxicityCnn::new(small_config().with_weight_decay(2e-4), 6, &m, 5, &dev).unwrap();
        let pa = a.l2_penalty().unwrap().to_scalar::<f32>().unwrap();
        let pb = b.l2_penalty().unwrap().to_scalar::<f32>().unwrap();
        assert!(pa > 0.0);
        assert!((pb - 2.0 * pa).abs() <= pa * 1e-5);
    }

    #[test]
    fn save_and_load_preserve_predictions() {
        let dev = Device::Cpu;
        let model = ToxicityCnn::new(small_config(), 6, &matrix(5, 4), 3, &dev).unwrap();
        let path = std::env::temp_dir().join(format!("toxicnn-cnn-{}.safetensors", std::process::id()));
        model.save(&path).unwrap();

        let loaded = ToxicityCnn::load(&path, small_config(), 6, &dev).unwrap();
        let _ = std::fs::remove_file(&path);

        let ids = Tensor::new(&[[0u32, 1, 2, 3, 4, 1]], &dev).unwrap();
        let a = model.predict_proba(&ids).unwrap().to_vec2::<f32>().unwrap();
        let b = loaded.predict_proba(&ids).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(a, b);

        let wrong = small_config().with_num_filters(4);
        let path2 = std::env::temp_dir().join(format!("toxicnn-cnn-b-{}.safetensors", std::process::id()));
        model.save(&path2).unwrap();
        let err = ToxicityCnn::load(&path2, wrong, 6, &dev);
        let _ = std::fs::remove_file(&path2);
        assert!(matches!(err, Err(ToxicnnError::ModelLoad(_))));
    }
}
