//! Seeded parameter initialisation.

use candle_core::{Device, Result, Shape, Tensor, Var};
use oorandom::Rand32;

/// Glorot/Xavier uniform variable: `U(-limit, limit)` with
/// `limit = sqrt(6 / (fan_in + fan_out))`.
pub fn glorot_uniform<S: Into<Shape>>(
    shape: S,
    fan_in: usize,
    fan_out: usize,
    rng: &mut Rand32,
    device: &Device,
) -> Result<Var> {
    let shape = shape.into();
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt() as f32;
    let values: Vec<f32> = (0..shape.elem_count())
        .map(|_| (rng.rand_float() * 2.0 - 1.0) * limit)
        .collect();
    Var::from_tensor(&Tensor::from_vec(values, shape, device)?)
}

/// Zero-initialised variable (biases).
pub fn zeros<S: Into<Shape>>(shape: S, device: &Device) -> Result<Var> {
    Var::zeros(shape, candle_core::DType::F32, device)
}
