use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A CV owned by a user. Only `skills` and `experience` feed the features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cv {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    /// creation time as unix seconds, used by `CvSelectionPolicy::MostRecent`
    #[serde(default)]
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirement: Option<String>,
}

/// Historical record that `user_id` applied to `job_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Apply {
    pub user_id: String,
    pub job_id: String,
}

impl Apply {
    pub fn new(user_id: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            job_id: job_id.into(),
        }
    }
}

/// Read-only access to the persistent store.
///
/// `find_*` return `None` for an unknown id; turning that into
/// `Error::DataNotFound` is the caller's job.
pub trait DataSource {
    fn list_users(&self) -> Result<Vec<User>>;
    fn list_jobs(&self) -> Result<Vec<Job>>;
    fn list_applies(&self) -> Result<Vec<Apply>>;
    fn find_user_by_id(&self, id: &str) -> Result<Option<User>>;
    fn find_job_by_id(&self, id: &str) -> Result<Option<Job>>;
    fn find_cvs_by_user_id(&self, user_id: &str) -> Result<Vec<Cv>>;
}

/// Plain record dump, the shape `InMemorySource` is loaded from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Records {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub cvs: Vec<Cv>,
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub applies: Vec<Apply>,
}

/// `DataSource` over in-memory collections, preserving input order.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Records,
    cvs_by_user: HashMap<String, Vec<usize>>,
}

impl InMemorySource {
    pub fn new(records: Records) -> Self {
        let mut cvs_by_user: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, cv) in records.cvs.iter().enumerate() {
            cvs_by_user.entry(cv.user_id.clone()).or_default().push(i);
        }
        Self {
            records,
            cvs_by_user,
        }
    }

    /// Load a JSON record dump
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read(path.as_ref())?;
        let records: Records = serde_json::from_slice(&raw)
            .map_err(|e| Error::Serialization(format!("{}: {}", path.as_ref().display(), e)))?;
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &Records {
        &self.records
    }
}

impl DataSource for InMemorySource {
    fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.records.users.clone())
    }

    fn list_jobs(&self) -> Result<Vec<Job>> {
        Ok(self.records.jobs.clone())
    }

    fn list_applies(&self) -> Result<Vec<Apply>> {
        Ok(self.records.applies.clone())
    }

    fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.records.users.iter().find(|u| u.id == id).cloned())
    }

    fn find_job_by_id(&self, id: &str) -> Result<Option<Job>> {
        Ok(self.records.jobs.iter().find(|j| j.id == id).cloned())
    }

    fn find_cvs_by_user_id(&self, user_id: &str) -> Result<Vec<Cv>> {
        Ok(self
            .cvs_by_user
            .get(user_id)
            .map(|idx| idx.iter().map(|&i| self.records.cvs[i].clone()).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_source_groups_cvs_by_user_in_input_order() {
        let records = Records {
            users: vec![User { id: "u1".into(), name: None }],
            cvs: vec![
                Cv { id: "c1".into(), user_id: "u1".into(), skills: None, experience: None, created_at: Some(5) },
                Cv { id: "c2".into(), user_id: "u2".into(), skills: None, experience: None, created_at: None },
                Cv { id: "c3".into(), user_id: "u1".into(), skills: None, experience: None, created_at: Some(9) },
            ],
            ..Default::default()
        };
        let src = InMemorySource::new(records);
        let ids: Vec<_> = src.find_cvs_by_user_id("u1").unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c1", "c3"]);
        assert!(src.find_cvs_by_user_id("nobody").unwrap().is_empty());
        assert!(src.find_user_by_id("u1").unwrap().is_some());
        assert!(src.find_job_by_id("j1").unwrap().is_none());
    }

    #[test]
    fn records_parse_with_missing_optional_fields() {
        let json = r#"{
            "users": [{"id": "u1"}],
            "jobs": [{"id": "j1", "description": "backend"}],
            "applies": [{"user_id": "u1", "job_id": "j1"}]
        }"#;
        let records: Records = serde_json::from_str(json).unwrap();
        assert_eq!(records.jobs[0].requirement, None);
        assert!(records.cvs.is_empty());
        assert_eq!(records.applies[0], Apply::new("u1", "j1"));
    }
}
