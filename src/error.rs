use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A user, job or CV referenced by a record could not be resolved.
    #[error("{entity} not found: {id}")]
    DataNotFound { entity: &'static str, id: String },

    #[error("Index build error: {0}")]
    IndexBuild(String),

    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid feature dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A model paired with a term index it was not trained against.
    #[error("Model trained on index generation {model}, index is at generation {index}")]
    GenerationMismatch { index: u64, model: u64 },

    #[error("Training already in progress for index {0:?}")]
    TrainingInProgress(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Error::DataNotFound {
            entity,
            id: id.into(),
        }
    }
}
