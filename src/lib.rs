/// This crate is a job recommendation feature pipeline built on a TF-IDF Vectorizer.
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod recommend;
pub mod utils;
pub mod vectorizer;

pub use error::{Error, Result};

/// Term Index
/// Owns the vocabulary and document-frequency statistics built from the
/// user/job corpus, and the directory they are persisted to.
///
/// Term slots are dense integers assigned in first-occurrence order (users
/// before jobs). `build_index` replaces the dictionary wholesale; a failed
/// build leaves the previous dictionary in place.
pub use vectorizer::index::{TermDictionary, TermIndex};

/// TF-IDF Vectorizer
/// Converts text into a dense vector of length `|V|` against one frozen
/// dictionary snapshot.
///
/// `tf = count / total`, `idf = ln(N / (df + 1)) + 1`.
/// Out-of-vocabulary tokens count toward `total` but have no slot.
pub use vectorizer::TfIdfVectorizer;

/// TF-IDF calculation engine trait and its default implementation
pub use vectorizer::tfidf::{DefaultTfIdfEngine, TfIdfEngine};

/// Tokenizer and per-document term counts
pub use vectorizer::token::{TermFrequency, Tokenizer};

/// Corpus documents and the per-entity text-extraction rules
pub use vectorizer::corpus::{CorpusBuilder, Document, DocumentKind, EntityText};

/// Plain records and the read-only data access the pipeline consumes
pub use recommend::records::{Apply, Cv, DataSource, InMemorySource, Job, Records, User};

/// Feature extraction, dataset construction and inference
pub use recommend::{
    dataset::{Dataset, DatasetBuilder, DatasetStats, NegativeSampling, TrainingExample},
    features::{CvSelectionPolicy, FeatureExtractor},
    scoring::{Hits, Recommender},
};

/// Feed-forward scorer and its trainer
pub use model::{
    trainer::{Trainer, TrainerConfig},
    Model, TrainingMetadata,
};

/// Training entry point
pub use config::PipelineConfig;
pub use pipeline::{ModelArtifactLocation, TrainingPipeline, TrainingRun};
