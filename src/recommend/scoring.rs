use std::{fmt::Debug, path::Path};

use rayon::prelude::*;

use crate::{
    error::{Error, Result},
    model::Model,
    recommend::{
        features::{CvSelectionPolicy, FeatureExtractor},
        records::{Cv, Job},
    },
    vectorizer::index::TermIndex,
};

/// Ranked recommendation results
pub struct Hits<K> {
    /// (Job ID, Score)
    pub list: Vec<(K, f32)>,
}

impl<K> Hits<K> {
    pub fn new(vec: Vec<(K, f32)>) -> Self {
        Hits { list: vec }
    }

    /// Sort results by descending score
    pub fn sort_by_score(&mut self) -> &mut Self {
        // Remove NaN scores
        self.list.retain(|(_, s)| !s.is_nan());
        self.list.sort_by(|a, b| b.1.total_cmp(&a.1));
        self
    }

    /// Keep the first `n` entries
    pub fn truncate(&mut self, n: usize) -> &mut Self {
        self.list.truncate(n);
        self
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl<K> Debug for Hits<K>
where
    K: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            writeln!(f, "Hits [")?;
            for (key, score) in &self.list {
                writeln!(f, "    {:?}: {:.6}", key, score)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}

/// Inference over a persisted index and model.
///
/// The model must have been trained against exactly the dictionary
/// generation it is paired with; its input width must match that dictionary.
#[derive(Debug)]
pub struct Recommender {
    extractor: FeatureExtractor,
    model: Model,
}

impl Recommender {
    pub fn new(extractor: FeatureExtractor, model: Model) -> Result<Self> {
        let index = extractor.vectorizer().generation();
        let trained_on = model.metadata().index_generation;
        if index != trained_on {
            return Err(Error::GenerationMismatch {
                index,
                model: trained_on,
            });
        }
        let expected = 2 * extractor.dim();
        if model.input_dim() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: model.input_dim(),
            });
        }
        Ok(Self { extractor, model })
    }

    /// Load the term index from `index_dir` and the model from `model_path`
    pub fn open<P, Q>(index_dir: P, model_path: Q, policy: CvSelectionPolicy) -> Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let index = TermIndex::open(index_dir)?;
        let model = Model::load(model_path)?;
        Self::new(FeatureExtractor::new(index.vectorizer(), policy), model)
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Score precomputed user and job vectors
    pub fn score(&self, user: &[f32], job: &[f32]) -> Result<f32> {
        self.model.score(user, job)
    }

    /// Score one user against one job
    pub fn score_pair(&self, user_id: &str, cvs: &[Cv], job: &Job) -> Result<f32> {
        let user = self.extractor.user_features(user_id, cvs)?;
        self.score(&user, &self.extractor.job_features(job))
    }

    /// Rank `jobs` for a user, best first
    ///
    /// # Arguments
    /// * `top_n` - keep at most this many hits, `None` keeps all
    pub fn recommend(
        &self,
        user_id: &str,
        cvs: &[Cv],
        jobs: &[Job],
        top_n: Option<usize>,
    ) -> Result<Hits<String>> {
        let user = self.extractor.user_features(user_id, cvs)?;
        let scored = jobs
            .par_iter()
            .map(|job| {
                let job_vec = self.extractor.job_features(job);
                self.score(&user, &job_vec).map(|s| (job.id.clone(), s))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut hits = Hits::new(scored);
        hits.sort_by_score();
        if let Some(n) = top_n {
            hits.truncate(n);
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::optim::AdamConfig,
        vectorizer::corpus::{Document, DocumentKind},
    };

    #[test]
    fn hits_sort_drops_nan_and_orders_desc() {
        let mut hits = Hits::new(vec![("a", 0.2), ("b", f32::NAN), ("c", 0.9), ("d", 0.5)]);
        hits.sort_by_score().truncate(2);
        let keys: Vec<_> = hits.list.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["c", "d"]);
        assert_eq!(format!("{:?}", Hits::<&str>::new(vec![])), "[]");
    }

    fn fixture() -> (TermIndex, Vec<Job>, Vec<Cv>) {
        let mut index = TermIndex::new();
        index
            .build_index(&[
                Document { text: "python sql".into(), kind: DocumentKind::UserCv, external_id: "u".into() },
                Document { text: "golang backend".into(), kind: DocumentKind::Job, external_id: "j".into() },
            ])
            .unwrap();
        let jobs = (0..3)
            .map(|i| Job {
                id: format!("j{i}"),
                title: None,
                description: Some(["python", "golang", "sql backend"][i].into()),
                requirement: None,
            })
            .collect();
        let cvs = vec![Cv {
            id: "c".into(),
            user_id: "u".into(),
            skills: Some("python".into()),
            experience: None,
            created_at: None,
        }];
        (index, jobs, cvs)
    }

    fn model_for(index: &TermIndex, input_dim: usize) -> Model {
        let mut model = Model::new(input_dim, &[4], AdamConfig::default(), 1);
        model.metadata_mut().index_generation = index.snapshot().generation();
        model
    }

    #[test]
    fn mismatched_model_is_rejected() {
        let (index, _, _) = fixture();
        let fx = FeatureExtractor::new(index.vectorizer(), CvSelectionPolicy::First);
        assert!(matches!(
            Recommender::new(fx, model_for(&index, 6)),
            Err(Error::DimensionMismatch { expected: 8, actual: 6 })
        ));
    }

    #[test]
    fn model_from_other_generation_is_rejected_even_with_same_width() {
        let (mut index, _, _) = fixture();
        let model = model_for(&index, 8);
        // same vocabulary size, different terms in the slots
        index
            .build_index(&[
                Document { text: "rust kotlin".into(), kind: DocumentKind::UserCv, external_id: "u".into() },
                Document { text: "swift linux".into(), kind: DocumentKind::Job, external_id: "j".into() },
            ])
            .unwrap();
        assert_eq!(index.vocab_size(), 4);
        let fx = FeatureExtractor::new(index.vectorizer(), CvSelectionPolicy::First);
        assert!(matches!(
            Recommender::new(fx, model),
            Err(Error::GenerationMismatch { index: 2, model: 1 })
        ));
    }

    #[test]
    fn recommend_ranks_all_jobs_consistently_with_score_pair() {
        let (index, jobs, cvs) = fixture();
        let fx = FeatureExtractor::new(index.vectorizer(), CvSelectionPolicy::First);
        let rec = Recommender::new(fx, model_for(&index, 8)).unwrap();

        let hits = rec.recommend("u", &cvs, &jobs, None).unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.list.windows(2).all(|w| w[0].1 >= w[1].1));
        for (id, score) in &hits.list {
            let job = jobs.iter().find(|j| &j.id == id).unwrap();
            assert_eq!(rec.score_pair("u", &cvs, job).unwrap(), *score);
        }
        assert_eq!(rec.recommend("u", &cvs, &jobs, Some(1)).unwrap().len(), 1);
        assert!(rec.recommend("u", &[], &jobs, None).is_err());
    }
}
