//! Multi-label loss and accuracy.
//!
//! Each output is an independent binary decision, so the loss is binary
//! cross-entropy on the sigmoid of every logit, averaged over all entries.

use candle_core::{DType, Result, Tensor};

/// Mean binary cross-entropy computed from logits.
///
/// Uses the stable form `max(x, 0) - x * t + ln(1 + exp(-|x|))`.
pub fn binary_cross_entropy_with_logits(logits: &Tensor, targets: &Tensor) -> Result<Tensor> {
    let relu = logits.relu()?;
    let cross = logits.mul(targets)?;
    let softplus = (logits.abs()?.neg()?.exp()? + 1.0)?.log()?;
    ((relu - cross)? + softplus)?.mean_all()
}

/// Number of label entries whose thresholded prediction matches the target.
///
/// A logit of zero is a probability of 0.5, which counts as negative.
pub fn correct_predictions(logits: &Tensor, targets: &Tensor) -> Result<f64> {
    let predicted = logits.gt(0.0)?;
    let actual = targets.ge(0.5)?;
    let correct = predicted
        .eq(&actual)?
        .to_dtype(DType::F32)?
        .sum_all()?
        .to_scalar::<f32>()?;
    Ok(f64::from(correct))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn bce_reference(x: f32, t: f32) -> f32 {
        let p = 1.0 / (1.0 + (-x).exp());
        -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
    }

    #[test]
    fn matches_reference_cross_entropy() {
        let dev = Device::Cpu;
        let xs = [2.0f32, -1.0, 0.5, -3.0];
        let ts = [1.0f32, 0.0, 0.0, 1.0];
        let logits = Tensor::new(&xs, &dev).unwrap();
        let targets = Tensor::new(&ts, &dev).unwrap();

        let loss = binary_cross_entropy_with_logits(&logits, &targets)
            .unwrap()
            .to_scalar::<f32>()
            .unwrap();
        let expected: f32 =
            xs.iter().zip(&ts).map(|(&x, &t)| bce_reference(x, t)).sum::<f32>() / 4.0;
        assert!((loss - expected).abs() < 1e-5);
    }

    #[test]
    fn stays_finite_for_saturated_logits() {
        let dev = Device::Cpu;
        let logits = Tensor::new(&[100.0f32, -100.0], &dev).unwrap();
        let targets = Tensor::new(&[0.0f32, 1.0], &dev).unwrap();
        let loss = binary_cross_entropy_with_logits(&logits, &targets)
            .unwrap()
            .to_scalar::<f32>()
            .unwrap();
        assert!(loss.is_finite());
        assert!((loss - 100.0).abs() < 1e-3);
    }

    #[test]
    fn counts_thresholded_matches() {
        let dev = Device::Cpu;
        let logits = Tensor::new(&[[1.0f32, -1.0, 0.0], [-2.0, 3.0, -0.1]], &dev).unwrap();
        let targets = Tensor::new(&[[1.0f32, 0.0, 0.0], [0.0, 0.0, 0.0]], &dev).unwrap();
        // only [1][1] misses; 0.5 at [0][2] counts negative
        assert_eq!(correct_predictions(&logits, &targets).unwrap(), 5.0);

        let half = Tensor::new(&[[0.0f32, 0.0]], &dev).unwrap();
        let truth = Tensor::new(&[[0.0f32, 1.0]], &dev).unwrap();
        assert_eq!(correct_predictions(&half, &truth).unwrap(), 1.0);
    }
}
