use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::trainer::TrainerConfig,
    recommend::{dataset::NegativeSampling, features::CvSelectionPolicy},
};

/// Settings for one training pipeline.
///
/// Every field has a default, so a config file only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// directory holding the persisted term index
    pub index_dir: PathBuf,
    /// model artifact file, overwritten by every successful run
    pub model_path: PathBuf,
    pub cv_policy: CvSelectionPolicy,
    pub sampling: NegativeSampling,
    pub trainer: TrainerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("./data/term_index"),
            model_path: PathBuf::from("./data/model.cbor"),
            cv_policy: CvSelectionPolicy::default(),
            sampling: NegativeSampling::default(),
            trainer: TrainerConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Read and validate a JSON config file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path)?;
        let config: Self = serde_json::from_slice(&raw)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.index_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("index_dir is empty".into()));
        }
        if self.model_path.as_os_str().is_empty() || self.model_path.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "model_path {:?} is not a file path",
                self.model_path
            )));
        }
        self.trainer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "cv_policy": "most_recent", "trainer": { "epochs": 3, "shuffle": true }, "sampling": { "max_retries": 2 } }"#,
        )
        .unwrap();
        let cfg = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.cv_policy, CvSelectionPolicy::MostRecent);
        assert_eq!(cfg.trainer.epochs, 3);
        assert!(cfg.trainer.shuffle);
        assert_eq!(cfg.trainer.batch_size, 64);
        assert_eq!(cfg.trainer.hidden_layers, vec![256, 128]);
        assert_eq!(cfg.sampling.max_retries, 2);
        assert_eq!(cfg.sampling.seed, NegativeSampling::default().seed);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "trainer": { "batch_size": 0 } }"#).unwrap();
        assert!(matches!(
            PipelineConfig::from_json_file(&path),
            Err(Error::InvalidConfig(_))
        ));
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            PipelineConfig::from_json_file(&path),
            Err(Error::InvalidConfig(_))
        ));
        let cfg = PipelineConfig {
            model_path: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
