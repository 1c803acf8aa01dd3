use serde::{Deserialize, Serialize};

use crate::recommend::records::{Cv, Job};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    UserCv,
    Job,
}

/// A tagged text document fed to the term index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub kind: DocumentKind,
    pub external_id: String,
}

/// Entity whose text can be turned into a document.
///
/// Each variant owns its text-extraction rule; a new entity kind is a new
/// variant here and nothing else in the vectorizer changes.
#[derive(Debug, Clone, Copy)]
pub enum EntityText<'a> {
    /// a user, represented by the CV selected for them
    UserCv { user_id: &'a str, cv: &'a Cv },
    Job(&'a Job),
}

impl<'a> EntityText<'a> {
    pub fn kind(&self) -> DocumentKind {
        match self {
            EntityText::UserCv { .. } => DocumentKind::UserCv,
            EntityText::Job(_) => DocumentKind::Job,
        }
    }

    pub fn external_id(&self) -> &'a str {
        match *self {
            EntityText::UserCv { user_id, .. } => user_id,
            EntityText::Job(job) => &job.id,
        }
    }

    /// Concatenated text fields, missing fields read as empty
    pub fn text(&self) -> String {
        match self {
            EntityText::UserCv { cv, .. } => join_fields(&cv.skills, &cv.experience),
            EntityText::Job(job) => join_fields(&job.description, &job.requirement),
        }
    }

    pub fn into_document(self) -> Document {
        Document {
            text: self.text(),
            kind: self.kind(),
            external_id: self.external_id().to_string(),
        }
    }
}

#[inline]
fn join_fields(a: &Option<String>, b: &Option<String>) -> String {
    format!(
        "{} {}",
        a.as_deref().unwrap_or_default(),
        b.as_deref().unwrap_or_default()
    )
}

/// Collects documents for one index build: users first, then jobs, each in
/// input order.
#[derive(Debug, Default)]
pub struct CorpusBuilder {
    users: Vec<Document>,
    jobs: Vec<Document>,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: EntityText<'_>) -> &mut Self {
        let doc = entity.into_document();
        match doc.kind {
            DocumentKind::UserCv => self.users.push(doc),
            DocumentKind::Job => self.jobs.push(doc),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.users.len() + self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn build(self) -> Vec<Document> {
        let mut docs = self.users;
        docs.extend(self.jobs);
        docs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, desc: Option<&str>, req: Option<&str>) -> Job {
        Job {
            id: id.into(),
            title: None,
            description: desc.map(Into::into),
            requirement: req.map(Into::into),
        }
    }

    fn cv(user: &str, skills: Option<&str>, exp: Option<&str>) -> Cv {
        Cv {
            id: format!("cv-{user}"),
            user_id: user.into(),
            skills: skills.map(Into::into),
            experience: exp.map(Into::into),
            created_at: None,
        }
    }

    #[test]
    fn text_joins_fields_with_single_space() {
        let j = job("j1", Some("backend"), Some("python"));
        assert_eq!(EntityText::Job(&j).text(), "backend python");
        let j = job("j2", None, Some("python"));
        assert_eq!(EntityText::Job(&j).text(), " python");
        let c = cv("u1", Some("rust"), None);
        assert_eq!(EntityText::UserCv { user_id: "u1", cv: &c }.text(), "rust ");
    }

    #[test]
    fn builder_orders_users_before_jobs() {
        let j = job("j1", Some("backend"), None);
        let c1 = cv("u1", Some("python"), None);
        let c2 = cv("u2", Some("go"), None);
        let mut b = CorpusBuilder::new();
        b.push(EntityText::Job(&j))
            .push(EntityText::UserCv { user_id: "u1", cv: &c1 })
            .push(EntityText::UserCv { user_id: "u2", cv: &c2 });
        assert_eq!(b.len(), 3);
        let ids: Vec<_> = b.build().into_iter().map(|d| (d.kind, d.external_id)).collect();
        assert_eq!(
            ids,
            vec![
                (DocumentKind::UserCv, "u1".to_string()),
                (DocumentKind::UserCv, "u2".to_string()),
                (DocumentKind::Job, "j1".to_string()),
            ]
        );
    }
}
