use serde::{Deserialize, Serialize};

/// Adam hyperparameters, stored with the model artifact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdamConfig {
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
}

impl AdamConfig {
    /// β₁=0.9, β₂=0.999, ε=1e-8
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self::new(1e-4)
    }
}

/// Adam optimizer (Kingma & Ba, 2015).
///
/// Update rule:
/// ```text
/// m_t = β₁ * m_{t-1} + (1 - β₁) * grad
/// v_t = β₂ * v_{t-1} + (1 - β₂) * grad²
/// m̂_t = m_t / (1 - β₁ᵗ)
/// v̂_t = v_t / (1 - β₂ᵗ)
/// param = param - lr * m̂_t / (√v̂_t + ε)
/// ```
///
/// Moment buffers are keyed by parameter position, so callers must pass
/// parameters in the same order on every step.
#[derive(Debug, Clone)]
pub struct Adam {
    config: AdamConfig,
    /// First moment estimates
    m: Vec<Vec<f32>>,
    /// Second moment estimates
    v: Vec<Vec<f32>>,
    /// Current timestep for bias correction
    t: u32,
}

impl Adam {
    pub fn new(config: AdamConfig) -> Self {
        Self {
            config,
            m: Vec::new(),
            v: Vec::new(),
            t: 0,
        }
    }

    pub fn config(&self) -> AdamConfig {
        self.config
    }

    pub fn steps(&self) -> u32 {
        self.t
    }

    /// One update over every `(param, grad)` pair
    pub fn step<'p, I>(&mut self, params: I)
    where
        I: IntoIterator<Item = (&'p mut [f32], &'p [f32])>,
    {
        self.t += 1;
        for (idx, (param, grad)) in params.into_iter().enumerate() {
            self.update_param(idx, param, grad);
        }
    }

    fn update_param(&mut self, idx: usize, param: &mut [f32], grad: &[f32]) {
        debug_assert_eq!(param.len(), grad.len());
        if idx >= self.m.len() {
            self.m.resize(idx + 1, Vec::new());
            self.v.resize(idx + 1, Vec::new());
        }
        if self.m[idx].len() != param.len() {
            self.m[idx] = vec![0.0; param.len()];
            self.v[idx] = vec![0.0; param.len()];
        }

        let AdamConfig {
            learning_rate,
            beta1,
            beta2,
            epsilon,
        } = self.config;
        let bias_correction1 = 1.0 - beta1.powi(self.t as i32);
        let bias_correction2 = 1.0 - beta2.powi(self.t as i32);
        let m = &mut self.m[idx];
        let v = &mut self.v[idx];

        for i in 0..param.len() {
            let g = grad[i];
            m[i] = beta1 * m[i] + (1.0 - beta1) * g;
            v[i] = beta2 * v[i] + (1.0 - beta2) * g * g;
            let m_hat = m[i] / bias_correction1;
            let v_hat = v[i] / bias_correction2;
            param[i] -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_moves_by_learning_rate() {
        let mut adam = Adam::new(AdamConfig::new(0.1));
        let mut p = vec![1.0f32, -1.0];
        let g = vec![0.5f32, -2.0];
        adam.step([(p.as_mut_slice(), g.as_slice())]);
        // bias-corrected first step is lr * sign(g)
        assert!((p[0] - 0.9).abs() < 1e-5);
        assert!((p[1] + 0.9).abs() < 1e-5);
        assert_eq!(adam.steps(), 1);
    }

    #[test]
    fn minimizes_quadratic() {
        let mut adam = Adam::new(AdamConfig::new(0.05));
        let mut p = vec![3.0f32];
        for _ in 0..500 {
            let g = vec![2.0 * p[0]];
            adam.step([(p.as_mut_slice(), g.as_slice())]);
        }
        assert!(p[0].abs() < 0.1, "p = {}", p[0]);
    }

    #[test]
    fn zero_gradient_is_a_no_op() {
        let mut adam = Adam::new(AdamConfig::default());
        let mut p = vec![0.7f32; 3];
        let g = vec![0.0f32; 3];
        adam.step([(p.as_mut_slice(), g.as_slice())]);
        assert_eq!(p, vec![0.7; 3]);
    }
}
