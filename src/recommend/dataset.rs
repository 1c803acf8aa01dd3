use std::collections::{HashMap, HashSet};

use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    recommend::{
        features::{combine, FeatureExtractor},
        records::{Apply, Cv, DataSource, Job, User},
    },
};

pub const POSITIVE: u8 = 1;
pub const NEGATIVE: u8 = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    /// `[user | job]`, length `2 * |V|`
    pub features: Vec<f32>,
    /// 1 = observed application, 0 = sampled non-application
    pub label: u8,
}

/// Negative sampling policy.
///
/// One draw per positive example. A draw that hits a positive pair is
/// rejected and retried at most `max_retries` times; with the default of 0
/// rejected draws are simply dropped, so the negative count may fall short
/// of the positive count. Accepted negatives are not deduplicated against
/// each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegativeSampling {
    pub seed: u64,
    pub max_retries: usize,
}

impl Default for NegativeSampling {
    fn default() -> Self {
        Self {
            seed: 42,
            max_retries: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetStats {
    pub positives: usize,
    pub negatives: usize,
    /// draws that landed on a positive pair or on a user without a CV
    pub rejected: usize,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub examples: Vec<TrainingExample>,
    pub stats: DatasetStats,
    /// feature length every example was built with
    pub input_dim: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

/// Builds labeled examples against the extractor's frozen dictionary.
pub struct DatasetBuilder<'a> {
    extractor: &'a FeatureExtractor,
    sampling: NegativeSampling,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(extractor: &'a FeatureExtractor, sampling: NegativeSampling) -> Self {
        Self { extractor, sampling }
    }

    /// Draw negative `(user, job)` index pairs
    ///
    /// # Arguments
    /// * `eligible` - per entry of `users`, whether the user has a CV to
    ///   vectorize; a draw on an ineligible user is rejected
    ///
    /// # Returns
    /// * accepted pairs, in draw order
    /// * number of rejected draws
    pub fn sample_negatives(
        &self,
        k: usize,
        users: &[User],
        jobs: &[Job],
        eligible: &[bool],
        positives: &HashSet<(&str, &str)>,
    ) -> (Vec<(usize, usize)>, usize) {
        let mut accepted = Vec::with_capacity(k);
        let mut rejected = 0;
        if users.is_empty() || jobs.is_empty() {
            return (accepted, rejected);
        }
        let mut rng = StdRng::seed_from_u64(self.sampling.seed);
        for _ in 0..k {
            for _attempt in 0..=self.sampling.max_retries {
                let u = rng.gen_range(0..users.len());
                let j = rng.gen_range(0..jobs.len());
                if !eligible.get(u).copied().unwrap_or(false)
                    || positives.contains(&(users[u].id.as_str(), jobs[j].id.as_str()))
                {
                    rejected += 1;
                    continue;
                }
                accepted.push((u, j));
                break;
            }
        }
        (accepted, rejected)
    }

    /// Build positives (one per apply) followed by sampled negatives
    ///
    /// # Errors
    /// `DataNotFound` for an apply that references an unknown user or job, or
    /// a user without a CV. Users without a CV are never drawn as negatives.
    pub fn build(
        &self,
        applies: &[Apply],
        users: &[User],
        jobs: &[Job],
        source: &dyn DataSource,
    ) -> Result<Dataset> {
        let mut apply_jobs = Vec::with_capacity(applies.len());
        let mut positives = HashSet::with_capacity(applies.len());
        for apply in applies {
            source
                .find_user_by_id(&apply.user_id)?
                .ok_or_else(|| Error::not_found("user", &apply.user_id))?;
            let job = source
                .find_job_by_id(&apply.job_id)?
                .ok_or_else(|| Error::not_found("job", &apply.job_id))?;
            apply_jobs.push(job);
            positives.insert((apply.user_id.as_str(), apply.job_id.as_str()));
        }

        // lookups stay sequential, the data source need not be thread-safe
        let mut cvs: HashMap<&str, Vec<Cv>> = HashMap::new();
        let user_ids = users
            .iter()
            .map(|u| u.id.as_str())
            .chain(applies.iter().map(|a| a.user_id.as_str()));
        for id in user_ids {
            if !cvs.contains_key(id) {
                cvs.insert(id, source.find_cvs_by_user_id(id)?);
            }
        }
        let policy = self.extractor.policy();
        let eligible: Vec<bool> = users
            .iter()
            .map(|u| policy.select(&cvs[u.id.as_str()]).is_some())
            .collect();

        let mut pairs: Vec<(&str, &Job, u8)> = applies
            .iter()
            .zip(&apply_jobs)
            .map(|(apply, job)| (apply.user_id.as_str(), job, POSITIVE))
            .collect();
        let positive_count = pairs.len();

        let (negatives, rejected) =
            self.sample_negatives(applies.len(), users, jobs, &eligible, &positives);
        pairs.extend(
            negatives
                .iter()
                .map(|&(u, j)| (users[u].id.as_str(), &jobs[j], NEGATIVE)),
        );
        debug!(accepted = negatives.len(), rejected, "negative sampling done");

        let user_features = self.user_features(&pairs, &cvs)?;
        let job_features = self.job_features(&pairs);

        let examples = pairs
            .iter()
            .map(|&(user, job, label)| TrainingExample {
                features: combine(&user_features[user], &job_features[job.id.as_str()]),
                label,
            })
            .collect();

        let stats = DatasetStats {
            positives: positive_count,
            negatives: negatives.len(),
            rejected,
        };
        info!(
            positives = stats.positives,
            negatives = stats.negatives,
            rejected = stats.rejected,
            "dataset built"
        );
        Ok(Dataset {
            examples,
            stats,
            input_dim: 2 * self.extractor.dim(),
        })
    }

    /// one vector per distinct user, computed in parallel
    fn user_features<'p>(
        &self,
        pairs: &[(&'p str, &Job, u8)],
        cvs: &HashMap<&str, Vec<Cv>>,
    ) -> Result<HashMap<&'p str, Vec<f32>>> {
        let mut seen = HashSet::new();
        let wanted: Vec<&'p str> = pairs.iter().map(|p| p.0).filter(|u| seen.insert(*u)).collect();
        wanted
            .par_iter()
            .map(|&user| {
                let user_cvs = cvs.get(user).map(Vec::as_slice).unwrap_or_default();
                self.extractor.user_features(user, user_cvs).map(|v| (user, v))
            })
            .collect()
    }

    fn job_features<'p>(&self, pairs: &[(&str, &'p Job, u8)]) -> HashMap<&'p str, Vec<f32>> {
        let mut seen = HashSet::new();
        let wanted: Vec<&'p Job> = pairs
            .iter()
            .map(|p| p.1)
            .filter(|&job| seen.insert(job.id.as_str()))
            .collect();
        wanted
            .par_iter()
            .map(|&job| (job.id.as_str(), self.extractor.job_features(job)))
            .collect()
    }
}
