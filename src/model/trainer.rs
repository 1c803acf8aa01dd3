use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    model::{
        layer::{Activation, DenseGrad},
        loss::{bce_grad, bce_mean},
        optim::{Adam, AdamConfig},
        Model,
    },
    recommend::dataset::TrainingExample,
    utils::math::mean,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub hidden_layers: Vec<usize>,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    pub seed: u64,
    /// Reshuffle example order every epoch. Off by default, which keeps the
    /// same example order in every epoch.
    pub shuffle: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![256, 128],
            epochs: 50,
            batch_size: 64,
            learning_rate: 1e-4,
            seed: 123,
            shuffle: false,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".into()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.hidden_layers.is_empty() || self.hidden_layers.contains(&0) {
            return Err(Error::InvalidConfig(
                "hidden_layers must be non-empty with non-zero widths".into(),
            ));
        }
        Ok(())
    }
}

/// Mini-batch trainer for `Model`.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train a fresh model
    ///
    /// # Arguments
    /// * `examples` - labeled examples, all of length `input_dim`
    /// * `input_dim` - `2 * |V|` of the dictionary the examples came from
    ///
    /// # Errors
    /// `EmptyCorpus` for no examples or a zero-width input,
    /// `DimensionMismatch` for an example of the wrong length.
    pub fn train(&self, examples: &[TrainingExample], input_dim: usize) -> Result<Model> {
        if examples.is_empty() {
            return Err(Error::EmptyCorpus("no training examples".into()));
        }
        if input_dim == 0 {
            return Err(Error::EmptyCorpus("vocabulary is empty".into()));
        }
        if let Some(bad) = examples.iter().find(|e| e.features.len() != input_dim) {
            return Err(Error::DimensionMismatch {
                expected: input_dim,
                actual: bad.features.len(),
            });
        }

        let cfg = &self.config;
        let mut model = Model::new(
            input_dim,
            &cfg.hidden_layers,
            AdamConfig::new(cfg.learning_rate),
            cfg.seed,
        );
        let mut adam = Adam::new(model.optimizer());
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let mut order: Vec<usize> = (0..examples.len()).collect();
        let mut loss_history = Vec::with_capacity(cfg.epochs);

        info!(
            examples = examples.len(),
            input_dim,
            epochs = cfg.epochs,
            batch_size = cfg.batch_size,
            shuffle = cfg.shuffle,
            "training started"
        );
        for epoch in 0..cfg.epochs {
            if cfg.shuffle {
                order.shuffle(&mut rng);
            }
            // a batch larger than the dataset is just one short batch
            let batch_losses: Vec<f32> = order
                .chunks(cfg.batch_size)
                .map(|batch| {
                    let mut input = Vec::with_capacity(batch.len() * input_dim);
                    let mut targets = Vec::with_capacity(batch.len());
                    for &i in batch {
                        input.extend_from_slice(&examples[i].features);
                        targets.push(f32::from(examples[i].label));
                    }
                    train_step(&mut model, &mut adam, &input, &targets)
                })
                .collect();
            let epoch_loss = mean(&batch_losses);
            debug!(epoch, loss = epoch_loss, "epoch done");
            loss_history.push(epoch_loss);
        }
        info!(
            final_loss = loss_history.last().copied().unwrap_or_default(),
            steps = adam.steps(),
            "training finished"
        );

        let meta = model.metadata_mut();
        meta.epochs = cfg.epochs;
        meta.batch_size = cfg.batch_size;
        meta.shuffle = cfg.shuffle;
        meta.examples = examples.len();
        meta.vocab_size = input_dim / 2;
        meta.loss_history = loss_history;
        Ok(model)
    }
}

/// Forward, backward and one Adam update on a single batch; returns the
/// batch mean loss before the update.
fn train_step(model: &mut Model, adam: &mut Adam, input: &[f32], targets: &[f32]) -> f32 {
    let layers = model.layers();
    let last = layers.len() - 1;

    // inputs[l] is the input of layer l; the output layer keeps its logits
    let mut inputs: Vec<Vec<f32>> = Vec::with_capacity(layers.len());
    inputs.push(input.to_vec());
    for layer in &layers[..last] {
        let out = layer.forward(&inputs[inputs.len() - 1]);
        inputs.push(out);
    }
    let logits = layers[last].linear(&inputs[last]);
    let probs: Vec<f32> = logits.iter().map(|&z| Activation::Sigmoid.apply(z)).collect();
    let loss = bce_mean(&logits, targets);

    let mut grads: Vec<DenseGrad> = Vec::with_capacity(layers.len());
    let mut grad_z = bce_grad(&probs, targets);
    for l in (0..=last).rev() {
        let (grad, grad_x) = layers[l].backward(&inputs[l], &grad_z);
        grads.push(grad);
        if l > 0 {
            let act = layers[l - 1].activation();
            grad_z = grad_x
                .iter()
                .zip(inputs[l].iter())
                .map(|(&g, &a)| g * act.derivative(a))
                .collect();
        }
    }
    grads.reverse();

    adam.step(
        model
            .layers_mut()
            .iter_mut()
            .zip(grads.iter())
            .flat_map(|(layer, grad)| {
                let (w, b) = layer.params_mut();
                [(w, grad.weight.as_slice()), (b, grad.bias.as_slice())]
            }),
    );
    loss
}
