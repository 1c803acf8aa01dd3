//! Binary cross-entropy for a sigmoid output unit.
//!
//! ```text
//! loss = -[y * log(σ(z)) + (1-y) * log(1-σ(z))]
//!      = max(z, 0) - z*y + log(1 + exp(-|z|))
//! ```
//!
//! Working from the logit `z` keeps the loss finite when the sigmoid
//! saturates.

/// Per-example BCE from a logit
#[inline]
pub fn bce_with_logit(z: f32, y: f32) -> f32 {
    z.max(0.0) - z * y + (1.0 + (-z.abs()).exp()).ln()
}

/// Mean BCE over a batch of logits
pub fn bce_mean(logits: &[f32], targets: &[f32]) -> f32 {
    assert_eq!(logits.len(), targets.len());
    if logits.is_empty() {
        return 0.0;
    }
    let total: f32 = logits
        .iter()
        .zip(targets.iter())
        .map(|(&z, &y)| bce_with_logit(z, y))
        .sum();
    total / logits.len() as f32
}

/// Gradient of the mean BCE w.r.t. each logit: `(σ(z) - y) / batch`
pub fn bce_grad(probs: &[f32], targets: &[f32]) -> Vec<f32> {
    assert_eq!(probs.len(), targets.len());
    let n = probs.len().max(1) as f32;
    probs
        .iter()
        .zip(targets.iter())
        .map(|(&p, &y)| (p - y) / n)
        .collect()
}
