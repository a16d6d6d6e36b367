//! Raw repository history sources
//!
//! This module provides a trait-based abstraction over where tags and commits
//! come from, so release resolution runs the same code whatever the backend.
//!
//! # Overview
//!
//! The primary abstraction is the [HistorySource] trait. The implementations are:
//!
//! - [local::LocalHistory]: a repository on disk, read with the `git2` crate
//! - [github::GithubHistory]: a GitHub repository, read through the GraphQL API
//! - [mock::MockHistory]: an in-memory linear history for tests
//!
//! Sources only fetch; tag filtering, boundary lookup and commit
//! classification live in [crate::boundary] and [crate::provider].

pub mod github;
pub mod local;
pub mod mock;

pub use github::{GithubHistory, GraphqlTransport, HttpTransport};
pub use local::LocalHistory;
pub use mock::MockHistory;

use crate::error::Result;
use chrono::{DateTime, Utc};

/// A tag as seen by a history source, peeled to the commit it marks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    /// Short tag name (e.g. "v1.2.0")
    pub name: String,
    /// Hash of the tagged commit
    pub commit: String,
    /// Commit date of the tagged commit
    pub date: DateTime<Utc>,
}

impl TagRef {
    pub fn new(name: impl Into<String>, commit: impl Into<String>, date: DateTime<Utc>) -> Self {
        TagRef {
            name: name.into(),
            commit: commit.into(),
            date,
        }
    }
}

/// Commit information before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommit {
    /// The full commit hash
    pub id: String,
    /// Author name
    pub author: String,
    /// Author date
    pub date: DateTime<Utc>,
    /// The full commit message
    pub message: String,
}

/// Where a history walk starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// Head of the analysed branch
    Head,
    /// A specific commit hash
    Commit(String),
}

/// Lazily produced commits, newest first
pub type CommitIter<'a> = Box<dyn Iterator<Item = Result<RawCommit>> + 'a>;

/// Read-only access to the history of one branch of a repository
///
/// ## Error Handling
///
/// Implementations map their transport errors (`git2::Error`, HTTP failures,
/// API errors) to [crate::error::NextverError::RepositoryAccess].
pub trait HistorySource {
    /// Human readable project name (e.g. "owner/repo" or the directory name)
    fn project(&self) -> String;

    /// All tags of the repository that point (directly or through an
    /// annotated tag) at a commit, in no particular order
    fn tags(&self) -> Result<Vec<TagRef>>;

    /// Walk history backward from `from`, newest first.
    ///
    /// The walk is lazy: callers stop pulling once they reach their boundary.
    /// Walking from [Anchor::Head] of a repository without commits yields nothing.
    fn commits(&self, from: &Anchor) -> Result<CommitIter<'_>>;

    /// Content of a file at the head of the analysed branch, `None` if absent
    fn read_file(&self, path: &str) -> Result<Option<String>>;
}
