use crate::error::{NextverError, Result};
use crate::history::{Anchor, CommitIter, HistorySource, RawCommit, TagRef};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;

/// In-memory linear history for testing without a repository
#[derive(Debug, Clone)]
pub struct MockHistory {
    project: String,
    /// Oldest first
    commits: Vec<RawCommit>,
    tags: Vec<TagRef>,
    files: HashMap<String, String>,
}

impl MockHistory {
    /// Create a new empty mock history
    pub fn new(project: impl Into<String>) -> Self {
        MockHistory {
            project: project.into(),
            commits: Vec::new(),
            tags: Vec::new(),
            files: HashMap::new(),
        }
    }

    /// Append a commit on top of the branch, returning its generated hash.
    ///
    /// Commits are dated one minute apart so their order matches their dates.
    pub fn commit(&mut self, message: &str) -> String {
        let index = self.commits.len();
        let id = format!("{:040x}", index + 1);
        self.commits.push(RawCommit {
            id: id.clone(),
            author: "Mock Author".to_string(),
            date: Self::date_of(index),
            message: message.to_string(),
        });
        id
    }

    /// Tag the current head of the branch
    pub fn tag_head(&mut self, name: impl Into<String>) {
        if let Some(head) = self.commits.last() {
            let tag = TagRef::new(name, head.id.clone(), head.date);
            self.tags.push(tag);
        }
    }

    /// Add a tag pointing at an arbitrary commit
    pub fn add_tag(&mut self, tag: TagRef) {
        self.tags.push(tag);
    }

    /// Store a file at the head of the branch
    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    fn date_of(index: usize) -> DateTime<Utc> {
        Utc.timestamp_opt(1_500_000_000 + 60 * index as i64, 0)
            .single()
            .unwrap_or_default()
    }
}

impl HistorySource for MockHistory {
    fn project(&self) -> String {
        self.project.clone()
    }

    fn tags(&self) -> Result<Vec<TagRef>> {
        Ok(self.tags.clone())
    }

    fn commits(&self, from: &Anchor) -> Result<CommitIter<'_>> {
        let end = match from {
            Anchor::Head => self.commits.len(),
            Anchor::Commit(id) => {
                let position = self
                    .commits
                    .iter()
                    .position(|c| &c.id == id)
                    .ok_or_else(|| NextverError::repository(format!("Unknown commit: {}", id)))?;
                position + 1
            }
        };

        Ok(Box::new(self.commits[..end].iter().rev().cloned().map(Ok)))
    }

    fn read_file(&self, path: &str) -> Result<Option<String>> {
        Ok(self.files.get(path).cloned())
    }
}
