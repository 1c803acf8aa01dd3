use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    recommend::records::{Cv, Job},
    vectorizer::{corpus::EntityText, TfIdfVectorizer},
};

/// Which of a user's CVs represents them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvSelectionPolicy {
    /// first CV in the order the data source returned them
    #[default]
    First,
    /// CV with the greatest `created_at`; undated CVs lose to dated ones,
    /// ties keep the earlier entry
    MostRecent,
}

impl CvSelectionPolicy {
    pub fn select<'a>(&self, cvs: &'a [Cv]) -> Option<&'a Cv> {
        match self {
            CvSelectionPolicy::First => cvs.first(),
            CvSelectionPolicy::MostRecent => cvs.iter().reduce(|best, cv| {
                if cv.created_at > best.created_at {
                    cv
                } else {
                    best
                }
            }),
        }
    }
}

/// Maps users (via their selected CV) and jobs to TF-IDF vectors.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    vectorizer: TfIdfVectorizer,
    policy: CvSelectionPolicy,
}

impl FeatureExtractor {
    pub fn new(vectorizer: TfIdfVectorizer, policy: CvSelectionPolicy) -> Self {
        Self { vectorizer, policy }
    }

    pub fn policy(&self) -> CvSelectionPolicy {
        self.policy
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }

    /// Length of a single user or job vector
    #[inline]
    pub fn dim(&self) -> usize {
        self.vectorizer.dim()
    }

    /// Features of a user, from the CV picked by the selection policy
    ///
    /// # Errors
    /// `DataNotFound` when the user has no CV
    pub fn user_features(&self, user_id: &str, cvs: &[Cv]) -> Result<Vec<f32>> {
        let cv = self
            .policy
            .select(cvs)
            .ok_or_else(|| Error::not_found("cv", user_id))?;
        Ok(self.entity_features(EntityText::UserCv { user_id, cv }))
    }

    pub fn job_features(&self, job: &Job) -> Vec<f32> {
        self.entity_features(EntityText::Job(job))
    }

    #[inline]
    pub fn entity_features(&self, entity: EntityText<'_>) -> Vec<f32> {
        self.vectorizer.vectorize(&entity.text())
    }
}

/// `[user | job]`, the model input
pub fn combine(user: &[f32], job: &[f32]) -> Vec<f32> {
    let mut out = Vec::with_capacity(user.len() + job.len());
    out.extend_from_slice(user);
    out.extend_from_slice(job);
    out
}
