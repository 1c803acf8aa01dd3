//! Weight initialization.
//!
//! Only Xavier/Glorot uniform is needed here: every dense layer of the
//! scorer is initialized with it, seeded so runs are reproducible.

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Xavier uniform initialization (Glorot & Bengio, 2010).
///
/// Samples `fan_in * fan_out` values from U(-a, a) where
/// a = sqrt(6 / (`fan_in` + `fan_out`)).
///
/// # Arguments
///
/// * `fan_in` - Number of input features
/// * `fan_out` - Number of output features
/// * `seed` - Random seed
#[must_use]
pub fn xavier_uniform(fan_in: usize, fan_out: usize, seed: u64) -> Vec<f32> {
    let a = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
    let mut rng = StdRng::seed_from_u64(seed);
    (0..fan_in * fan_out).map(|_| rng.gen_range(-a..a)).collect()
}
