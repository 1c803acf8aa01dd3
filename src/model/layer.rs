use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{model::init::xavier_uniform, utils::math::{axpy, dot}};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    Sigmoid,
}

impl Activation {
    #[inline]
    pub fn apply(&self, z: f32) -> f32 {
        match self {
            Activation::Relu => z.max(0.0),
            Activation::Sigmoid => sigmoid(z),
        }
    }

    /// Derivative expressed through the activated output `a = f(z)`
    #[inline]
    pub fn derivative(&self, a: f32) -> f32 {
        match self {
            Activation::Relu => {
                if a > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Sigmoid => a * (1.0 - a),
        }
    }
}

/// Numerically stable logistic function
#[inline]
pub fn sigmoid(z: f32) -> f32 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Shape and activation of a dense layer, enough to rebuild it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub in_features: usize,
    pub out_features: usize,
    pub activation: Activation,
}

/// Fully connected layer: a = f(xW^T + b)
///
/// # Shape
///
/// - weight: `[out_features, in_features]`, row-major
/// - input: `[batch, in_features]`, flattened
/// - output: `[batch, out_features]`, flattened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    spec: LayerSpec,
    weight: Vec<f32>,
    bias: Vec<f32>,
}

/// Parameter gradients of one `Dense` layer.
#[derive(Debug, Clone)]
pub struct DenseGrad {
    pub weight: Vec<f32>,
    pub bias: Vec<f32>,
}

impl Dense {
    /// Xavier-initialized weights, zero bias
    pub fn new(in_features: usize, out_features: usize, activation: Activation, seed: u64) -> Self {
        Self {
            spec: LayerSpec {
                in_features,
                out_features,
                activation,
            },
            weight: xavier_uniform(in_features, out_features, seed),
            bias: vec![0.0; out_features],
        }
    }

    pub fn spec(&self) -> LayerSpec {
        self.spec
    }

    pub fn in_features(&self) -> usize {
        self.spec.in_features
    }

    pub fn out_features(&self) -> usize {
        self.spec.out_features
    }

    pub fn activation(&self) -> Activation {
        self.spec.activation
    }

    pub fn weight(&self) -> &[f32] {
        &self.weight
    }

    pub fn bias(&self) -> &[f32] {
        &self.bias
    }

    /// Shapes of stored parameters agree with `LayerSpec`
    pub fn is_consistent(&self) -> bool {
        self.weight.len() == self.spec.in_features * self.spec.out_features
            && self.bias.len() == self.spec.out_features
    }

    /// Pre-activation `z = xW^T + b` for a flattened batch
    pub fn linear(&self, input: &[f32]) -> Vec<f32> {
        let (n_in, n_out) = (self.spec.in_features, self.spec.out_features);
        debug_assert!(n_in > 0 && input.len() % n_in == 0, "input is not [batch, in_features]");
        let batch = input.len() / n_in.max(1);
        let mut out = vec![0.0f32; batch * n_out];
        out.par_chunks_mut(n_out.max(1))
            .zip(input.par_chunks(n_in.max(1)))
            .for_each(|(row_out, x)| {
                for (o, z) in row_out.iter_mut().enumerate() {
                    *z = dot(&self.weight[o * n_in..(o + 1) * n_in], x) + self.bias[o];
                }
            });
        out
    }

    /// Activated output for a flattened batch
    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        let act = self.spec.activation;
        let mut out = self.linear(input);
        out.iter_mut().for_each(|z| *z = act.apply(*z));
        out
    }

    /// Backpropagate `grad_z` (loss gradient w.r.t. this layer's
    /// pre-activation)
    ///
    /// # Returns
    /// * parameter gradients
    /// * gradient w.r.t. the layer input, `[batch, in_features]`
    pub fn backward(&self, input: &[f32], grad_z: &[f32]) -> (DenseGrad, Vec<f32>) {
        let (n_in, n_out) = (self.spec.in_features, self.spec.out_features);
        let batch = grad_z.len() / n_out.max(1);

        let mut grad_w = vec![0.0f32; n_in * n_out];
        if n_in > 0 {
            grad_w
                .par_chunks_mut(n_in)
                .enumerate()
                .for_each(|(o, row)| {
                    for b in 0..batch {
                        let g = grad_z[b * n_out + o];
                        if g != 0.0 {
                            axpy(g, &input[b * n_in..(b + 1) * n_in], row);
                        }
                    }
                });
        }

        let mut grad_b = vec![0.0f32; n_out];
        for b in 0..batch {
            axpy(1.0, &grad_z[b * n_out..(b + 1) * n_out], &mut grad_b);
        }

        let mut grad_x = vec![0.0f32; batch * n_in];
        if n_in > 0 {
            grad_x
                .par_chunks_mut(n_in)
                .enumerate()
                .for_each(|(b, row)| {
                    for o in 0..n_out {
                        let g = grad_z[b * n_out + o];
                        if g != 0.0 {
                            axpy(g, &self.weight[o * n_in..(o + 1) * n_in], row);
                        }
                    }
                });
        }

        (
            DenseGrad {
                weight: grad_w,
                bias: grad_b,
            },
            grad_x,
        )
    }

    /// Mutable parameter slices, weight first
    pub fn params_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.weight, &mut self.bias)
    }
}
