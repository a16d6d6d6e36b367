//! Release boundary resolution
//!
//! Tags matching the version pattern split the history of a branch into
//! releases. A release spans the commits reachable from its own tag (inclusive)
//! back to the next older matching tag (exclusive). The unreleased range runs
//! from the branch head back to the most recent matching tag.

use crate::domain::{version_key, VersionPattern};
use crate::error::Result;
use crate::history::{Anchor, RawCommit, TagRef};
use std::cmp::Reverse;
use std::fmt;
use tracing::warn;

/// Non-fatal conditions met while resolving a release range.
/// They are logged and do not change the result.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// No new commits since the latest tag
    NoNewCommits {
        latest_tag: String,
        current_commit_hash: String,
    },
    /// History walk ended without meeting the previous release
    BoundaryNotReached { commit: String },
    /// Only the most recent tags of the remote repository were read
    TagWindowExhausted { window: usize },
    /// The remote history walk stopped at its commit window
    HistoryWindowExhausted { window: usize },
}

fn short_hash(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoNewCommits {
                latest_tag,
                current_commit_hash,
            } => write!(
                f,
                "No new commits since tag '{}' (current: {})",
                latest_tag,
                short_hash(current_commit_hash)
            ),
            BoundaryWarning::BoundaryNotReached { commit } => write!(
                f,
                "History ended before reaching commit {}; the changelog may include older releases",
                short_hash(commit)
            ),
            BoundaryWarning::TagWindowExhausted { window } => write!(
                f,
                "Repository has more than {} tags; only the {} most recent were read",
                window, window
            ),
            BoundaryWarning::HistoryWindowExhausted { window } => write!(
                f,
                "Stopped after {} commits without reaching the previous release; the changelog is truncated",
                window
            ),
        }
    }
}

/// Commit range of one release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseBoundary {
    /// First commit of the walk (inclusive)
    pub from: Anchor,
    /// Commit that stops the walk (exclusive), `None` for the start of history
    pub to: Option<String>,
    /// Tag of this release, `None` for the unreleased range
    pub tag: Option<TagRef>,
    /// Tag of the previous release, if any
    pub previous: Option<TagRef>,
}

/// Order tags newest first by date.
///
/// Tags sharing a date are ordered by their version read through `pattern`,
/// highest first, so every backend picks the same latest release.
pub fn sort_tags(tags: &mut [TagRef], pattern: &VersionPattern) {
    tags.sort_by_cached_key(|tag| Reverse((tag.date, version_key(pattern, &tag.name))));
}

/// Keep the tags matching `pattern`, newest first
pub fn release_tags(tags: Vec<TagRef>, pattern: &VersionPattern) -> Vec<TagRef> {
    let mut matching: Vec<TagRef> = tags
        .into_iter()
        .filter(|tag| pattern.matches(&tag.name))
        .collect();
    sort_tags(&mut matching, pattern);
    matching
}

/// Find the range of the release named `target` among sorted release tags.
///
/// An empty `target` selects the unreleased range ending at the branch head.
/// Returns `None` when no tag has that name.
pub fn resolve(tags: &[TagRef], target: &str) -> Option<ReleaseBoundary> {
    if target.is_empty() {
        let latest = tags.first();
        return Some(ReleaseBoundary {
            from: Anchor::Head,
            to: latest.map(|t| t.commit.clone()),
            tag: None,
            previous: latest.cloned(),
        });
    }

    let position = tags.iter().position(|t| t.name == target)?;
    let tag = &tags[position];
    let previous = tags.get(position + 1);

    Some(ReleaseBoundary {
        from: Anchor::Commit(tag.commit.clone()),
        to: previous.map(|t| t.commit.clone()),
        tag: Some(tag.clone()),
        previous: previous.cloned(),
    })
}

/// Pull commits from a newest-first walk until the `to` commit is met.
///
/// `to` itself is excluded. Without `to` the walk is drained.
pub fn collect_range<I>(commits: I, to: Option<&str>) -> Result<Vec<RawCommit>>
where
    I: IntoIterator<Item = Result<RawCommit>>,
{
    let mut range = Vec::new();
    let mut reached = to.is_none();

    for commit in commits {
        let commit = commit?;
        if Some(commit.id.as_str()) == to {
            reached = true;
            break;
        }
        range.push(commit);
    }

    if let (false, Some(commit)) = (reached, to) {
        warn!(
            "{}",
            BoundaryWarning::BoundaryNotReached {
                commit: commit.to_string()
            }
        );
    }

    Ok(range)
}
