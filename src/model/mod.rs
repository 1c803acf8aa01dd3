pub mod init;
pub mod layer;
pub mod loss;
pub mod optim;
pub mod trainer;

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{Error, Result},
    model::{
        layer::{Activation, Dense, LayerSpec},
        optim::AdamConfig,
    },
    utils::fs::StagedFile,
};

const ARTIFACT_VERSION: u32 = 1;

/// Where and how a model was trained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    pub seed: u64,
    pub epochs: usize,
    pub batch_size: usize,
    pub shuffle: bool,
    pub examples: usize,
    /// `|V|` of the dictionary the features were built with
    pub vocab_size: usize,
    pub index_generation: u64,
    /// mean loss per epoch
    pub loss_history: Vec<f32>,
}

/// Feed-forward binary scorer.
///
/// Hidden layers use ReLU, the single output unit uses a sigmoid. The model
/// carries its own topology, so a persisted artifact is enough for
/// inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    layers: Vec<Dense>,
    optimizer: AdamConfig,
    metadata: TrainingMetadata,
}

#[derive(Serialize)]
struct ArtifactRef<'a> {
    version: u32,
    model: &'a Model,
}

#[derive(Deserialize)]
struct Artifact {
    version: u32,
    model: Model,
}

impl Model {
    /// Untrained model `input -> hidden... (ReLU) -> 1 (sigmoid)`
    ///
    /// # Arguments
    /// * `input_dim` - combined feature length, `2 * |V|`
    /// * `hidden` - hidden layer widths
    /// * `seed` - layer `i` is initialized with `seed + i`
    pub fn new(input_dim: usize, hidden: &[usize], optimizer: AdamConfig, seed: u64) -> Self {
        let mut layers = Vec::with_capacity(hidden.len() + 1);
        let mut fan_in = input_dim;
        for (i, &width) in hidden.iter().enumerate() {
            layers.push(Dense::new(fan_in, width, Activation::Relu, seed.wrapping_add(i as u64)));
            fan_in = width;
        }
        layers.push(Dense::new(
            fan_in,
            1,
            Activation::Sigmoid,
            seed.wrapping_add(hidden.len() as u64),
        ));
        Self {
            layers,
            optimizer,
            metadata: TrainingMetadata {
                seed,
                ..Default::default()
            },
        }
    }

    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, Dense::in_features)
    }

    pub fn topology(&self) -> Vec<LayerSpec> {
        self.layers.iter().map(Dense::spec).collect()
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Dense] {
        &mut self.layers
    }

    pub fn optimizer(&self) -> AdamConfig {
        self.optimizer
    }

    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut TrainingMetadata {
        &mut self.metadata
    }

    /// Probabilities for a flattened `[batch, input_dim]` input
    pub fn predict_batch(&self, input: &[f32]) -> Result<Vec<f32>> {
        let dim = self.input_dim();
        if dim == 0 || input.len() % dim != 0 {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: input.len(),
            });
        }
        let mut activation = input.to_vec();
        for layer in &self.layers {
            activation = layer.forward(&activation);
        }
        Ok(activation)
    }

    /// Probability in `[0, 1]` for one combined feature vector
    pub fn predict(&self, features: &[f32]) -> Result<f32> {
        if features.len() != self.input_dim() {
            return Err(Error::DimensionMismatch {
                expected: self.input_dim(),
                actual: features.len(),
            });
        }
        Ok(self.predict_batch(features)?[0])
    }

    /// Compatibility score of a user vector and a job vector
    pub fn score(&self, user: &[f32], job: &[f32]) -> Result<f32> {
        let half = self.input_dim() / 2;
        if user.len() != half || job.len() != half {
            return Err(Error::DimensionMismatch {
                expected: half,
                actual: if user.len() != half { user.len() } else { job.len() },
            });
        }
        let mut features = Vec::with_capacity(self.input_dim());
        features.extend_from_slice(user);
        features.extend_from_slice(job);
        self.predict(&features)
    }

    /// Write the model artifact
    ///
    /// # Arguments
    /// * `path` - artifact file
    /// * `overwrite` - replace an existing file; otherwise an existing file
    ///   is an error
    pub fn save<P: AsRef<Path>>(&self, path: P, overwrite: bool) -> Result<()> {
        let path = path.as_ref();
        self.stage(path, overwrite)?
            .commit()
            .map_err(|e| Error::Persistence(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "model saved");
        Ok(())
    }

    /// Write the artifact beside `path` without replacing what is there;
    /// `save` is `stage` followed by `commit`
    pub fn stage<P: AsRef<Path>>(&self, path: P, overwrite: bool) -> Result<StagedFile> {
        let path = path.as_ref();
        if path.exists() && !overwrite {
            return Err(Error::Persistence(format!(
                "{} already exists",
                path.display()
            )));
        }
        let bytes = serde_cbor::to_vec(&ArtifactRef {
            version: ARTIFACT_VERSION,
            model: self,
        })
        .map_err(|e| Error::Persistence(format!("encode model: {}", e)))?;
        StagedFile::write(path, &bytes)
            .map_err(|e| Error::Persistence(format!("{}: {}", path.display(), e)))
    }

    /// Read a model artifact written by `save`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| Error::Persistence(format!("{}: {}", path.display(), e)))?;
        let artifact: Artifact = serde_cbor::from_slice(&bytes)
            .map_err(|e| Error::Serialization(format!("decode {}: {}", path.display(), e)))?;
        if artifact.version != ARTIFACT_VERSION {
            return Err(Error::Persistence(format!(
                "unsupported model artifact version {}",
                artifact.version
            )));
        }
        let model = artifact.model;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        let mut fan_in = self.input_dim();
        for layer in &self.layers {
            if !layer.is_consistent() || layer.in_features() != fan_in {
                return Err(Error::Serialization(format!(
                    "inconsistent layer {:?}",
                    layer.spec()
                )));
            }
            fan_in = layer.out_features();
        }
        if self.layers.is_empty() || fan_in != 1 {
            return Err(Error::Serialization("model must end in a single output".into()));
        }
        Ok(())
    }
}
