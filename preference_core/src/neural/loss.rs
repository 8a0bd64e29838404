//! Loss and metric functions for binary preference targets.

use ndarray::ArrayView1;

/// Probabilities are clipped to `[EPSILON, 1 - EPSILON]` before taking logs.
pub const EPSILON: f32 = 1e-7;

/// Mean binary cross-entropy.
///
/// # Arguments
///
/// * `probs` - Predicted probabilities of label 1
/// * `targets` - Labels, each 0.0 or 1.0
///
/// # Returns
///
/// Mean loss over the batch, 0.0 for an empty batch
pub fn binary_cross_entropy(probs: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32 {
    assert_eq!(probs.len(), targets.len(), "shape mismatch for BCE");
    if probs.is_empty() {
        return 0.0;
    }

    let total: f32 = probs
        .iter()
        .zip(targets.iter())
        .map(|(&p, &y)| {
            let p = p.clamp(EPSILON, 1.0 - EPSILON);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();

    total / probs.len() as f32
}

/// Fraction of predictions on the correct side of 0.5.
pub fn binary_accuracy(probs: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32 {
    assert_eq!(probs.len(), targets.len(), "shape mismatch for accuracy");
    if probs.is_empty() {
        return 0.0;
    }

    let correct = probs
        .iter()
        .zip(targets.iter())
        .filter(|(&p, &y)| (p > 0.5) == (y > 0.5))
        .count();

    correct as f32 / probs.len() as f32
}
