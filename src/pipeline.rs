use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::{const_mutex, Mutex};
use tracing::{debug, info};

use crate::{
    config::PipelineConfig,
    error::{Error, Result},
    model::{trainer::Trainer, Model},
    recommend::{
        dataset::{DatasetBuilder, DatasetStats},
        features::FeatureExtractor,
        records::DataSource,
    },
    vectorizer::{
        corpus::{CorpusBuilder, EntityText},
        index::{store::IndexStore, TermDictionary, TermIndex},
        TfIdfVectorizer,
    },
};

/// Index locations with a training run in progress.
static RUNNING: Mutex<Vec<PathBuf>> = const_mutex(Vec::new());

/// Holds an index location for the lifetime of one run.
struct RunGuard {
    key: PathBuf,
}

impl RunGuard {
    fn acquire(index_dir: &Path) -> Result<Self> {
        // one key per directory however it is spelled
        fs::create_dir_all(index_dir)?;
        let key = fs::canonicalize(index_dir)?;
        let mut running = RUNNING.lock();
        if running.contains(&key) {
            return Err(Error::TrainingInProgress(key));
        }
        running.push(key.clone());
        Ok(Self { key })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        RUNNING.lock().retain(|p| p != &self.key);
    }
}

/// Result of `TrainingPipeline::train`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifactLocation {
    pub path: PathBuf,
    pub input_dim: usize,
    pub vocab_size: usize,
    pub index_generation: u64,
    pub stats: DatasetStats,
}

/// A trained model and the dictionary it was trained against, neither of
/// them persisted yet.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub model: Model,
    pub dictionary: Arc<TermDictionary>,
    pub stats: DatasetStats,
    pub index_generation: u64,
}

impl TrainingRun {
    /// Write the term index and the model as a pair
    ///
    /// Both files are fully written beside their destinations before either
    /// replaces its predecessor, so an encode or write failure leaves the
    /// previous index and model in place.
    pub fn persist<P, Q>(&self, index_dir: P, model_path: Q) -> Result<ModelArtifactLocation>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let model_path = model_path.as_ref();
        let store = IndexStore::new(index_dir);
        let index_file = store.stage(&self.dictionary)?;
        let model_file = self.model.stage(model_path, true)?;

        index_file
            .commit()
            .map_err(|e| Error::IndexBuild(format!("{}: {}", store.dir().display(), e)))?;
        model_file
            .commit()
            .map_err(|e| Error::Persistence(format!("{}: {}", model_path.display(), e)))?;
        info!(
            index = %store.file_path().display(),
            model = %model_path.display(),
            generation = self.index_generation,
            "term index and model persisted"
        );
        Ok(ModelArtifactLocation {
            path: model_path.to_path_buf(),
            input_dim: self.model.input_dim(),
            vocab_size: self.model.metadata().vocab_size,
            index_generation: self.index_generation,
            stats: self.stats,
        })
    }
}

/// Batch job: index build -> dataset build -> train -> persist.
///
/// Runs against the same `index_dir` are single-flight within the process;
/// a second concurrent run fails with `Error::TrainingInProgress` instead of
/// waiting.
pub struct TrainingPipeline<S> {
    config: PipelineConfig,
    source: S,
}

impl<S> TrainingPipeline<S>
where
    S: DataSource,
{
    pub fn new(config: PipelineConfig, source: S) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, source })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run the whole pipeline, then replace the persisted term index and
    /// model artifact together
    ///
    /// Nothing on disk changes unless training succeeds and both files are
    /// written.
    pub fn train(&self) -> Result<ModelArtifactLocation> {
        let _guard = RunGuard::acquire(&self.config.index_dir)?;
        let run = self.execute()?;
        run.persist(&self.config.index_dir, &self.config.model_path)
    }

    /// Everything `train` does except persisting, for callers that want to
    /// keep the model in memory when saving fails
    pub fn run(&self) -> Result<TrainingRun> {
        let _guard = RunGuard::acquire(&self.config.index_dir)?;
        self.execute()
    }

    fn execute(&self) -> Result<TrainingRun> {
        let users = self.source.list_users()?;
        let jobs = self.source.list_jobs()?;
        let applies = self.source.list_applies()?;
        info!(
            users = users.len(),
            jobs = jobs.len(),
            applies = applies.len(),
            "training run started"
        );
        if applies.is_empty() {
            return Err(Error::EmptyCorpus("no apply records".into()));
        }

        let mut corpus = CorpusBuilder::new();
        for user in &users {
            let cvs = self.source.find_cvs_by_user_id(&user.id)?;
            match self.config.cv_policy.select(&cvs) {
                Some(cv) => {
                    corpus.push(EntityText::UserCv { user_id: &user.id, cv });
                }
                None => debug!(user = %user.id, "user has no cv, left out of the corpus"),
            }
        }
        for job in &jobs {
            corpus.push(EntityText::Job(job));
        }
        if corpus.is_empty() {
            return Err(Error::EmptyCorpus("no user or job documents".into()));
        }

        // the previous generation stays on disk until `persist`
        let index = TermIndex::open(&self.config.index_dir)?;
        let dictionary = Arc::new(index.stage(&corpus.build()));
        let index_generation = dictionary.generation();
        info!(
            docs = dictionary.doc_num(),
            vocab = dictionary.len(),
            generation = index_generation,
            "term index staged"
        );

        // one frozen snapshot for the whole dataset
        let vectorizer: TfIdfVectorizer =
            TfIdfVectorizer::new(index.tokenizer().clone(), Arc::clone(&dictionary));
        let extractor = FeatureExtractor::new(vectorizer, self.config.cv_policy);
        let dataset = DatasetBuilder::new(&extractor, self.config.sampling)
            .build(&applies, &users, &jobs, &self.source)?;

        let trainer = Trainer::new(self.config.trainer.clone())?;
        let mut model = trainer.train(&dataset.examples, dataset.input_dim)?;
        model.metadata_mut().index_generation = index_generation;

        Ok(TrainingRun {
            model,
            dictionary,
            stats: dataset.stats,
            index_generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_exclusive_per_location_and_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");

        let first = RunGuard::acquire(&a).unwrap();
        assert!(matches!(RunGuard::acquire(&a), Err(Error::TrainingInProgress(_))));
        let other = RunGuard::acquire(&b).unwrap();
        drop(first);
        let again = RunGuard::acquire(&a).unwrap();
        drop(again);
        drop(other);
    }

    #[test]
    fn guard_key_ignores_path_spelling() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("x")).unwrap();
        let plain = dir.path().join("idx");
        let _held = RunGuard::acquire(&plain).unwrap();
        let dotted = dir.path().join("x").join("..").join("idx");
        assert!(matches!(RunGuard::acquire(&dotted), Err(Error::TrainingInProgress(_))));

        #[cfg(unix)]
        {
            let link = dir.path().join("link");
            std::os::unix::fs::symlink(&plain, &link).unwrap();
            assert!(matches!(RunGuard::acquire(&link), Err(Error::TrainingInProgress(_))));
        }
    }
}
