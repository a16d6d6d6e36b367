use crate::error::{NextverError, Result};
use crate::history::{Anchor, CommitIter, HistorySource, RawCommit, TagRef};
use chrono::{DateTime, TimeZone, Utc};
use git2::{BranchType, ErrorCode, Oid, Repository};
use std::path::Path;
use tracing::debug;

/// History of a repository on disk, read through `git2`
pub struct LocalHistory {
    repo: Repository,
    branch: Option<String>,
}

impl LocalHistory {
    /// Open or discover a git repository.
    ///
    /// Without a branch, history is walked from `HEAD`.
    pub fn open<P: AsRef<Path>>(path: P, branch: Option<String>) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|e| {
            NextverError::repository(format!(
                "Cannot open repository '{}': {}",
                path.display(),
                e.message()
            ))
        })?;

        Ok(LocalHistory { repo, branch })
    }

    /// Walk `branch` instead of the current one
    pub fn with_branch(mut self, branch: String) -> Self {
        self.branch = Some(branch);
        self
    }

    /// Commit at the head of the analysed branch, `None` while it has no commits
    fn head_oid(&self) -> Result<Option<Oid>> {
        if let Some(branch_name) = &self.branch {
            let branch = self
                .repo
                .find_branch(branch_name, BranchType::Local)
                .map_err(|e| {
                    NextverError::repository(format!(
                        "Cannot find branch '{}': {}",
                        branch_name,
                        e.message()
                    ))
                })?;
            let commit = branch.into_reference().peel_to_commit()?;
            return Ok(Some(commit.id()));
        }

        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?.id())),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                debug!("repository has no commits yet");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn to_utc(time: git2::Time) -> DateTime<Utc> {
    Utc.timestamp_opt(time.seconds(), 0)
        .single()
        .unwrap_or_default()
}

impl HistorySource for LocalHistory {
    fn project(&self) -> String {
        let root = self.repo.workdir().unwrap_or_else(|| self.repo.path());
        root.canonicalize()
            .unwrap_or_else(|_| root.to_path_buf())
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn tags(&self) -> Result<Vec<TagRef>> {
        let names = self.repo.tag_names(None)?;
        let mut tags = Vec::new();

        for name in names.iter().flatten() {
            let reference = self.repo.find_reference(&format!("refs/tags/{}", name))?;

            // Tags of trees or blobs are not releases
            let commit = match reference.peel_to_commit() {
                Ok(commit) => commit,
                Err(e) => {
                    debug!(tag = name, "skipping tag: {}", e.message());
                    continue;
                }
            };

            tags.push(TagRef::new(
                name,
                commit.id().to_string(),
                to_utc(commit.time()),
            ));
        }

        Ok(tags)
    }

    fn commits(&self, from: &Anchor) -> Result<CommitIter<'_>> {
        let start = match from {
            Anchor::Head => match self.head_oid()? {
                Some(oid) => oid,
                None => return Ok(Box::new(std::iter::empty())),
            },
            Anchor::Commit(id) => Oid::from_str(id)?,
        };

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;
        revwalk.push(start)?;

        let repo = &self.repo;
        let commits = revwalk.map(move |oid_result| -> Result<RawCommit> {
            let oid = oid_result?;
            let commit = repo.find_commit(oid)?;

            let message = commit.message().unwrap_or("").to_string();
            let author = commit.author().name().unwrap_or("unknown").to_string();
            let date = to_utc(commit.author().when());

            Ok(RawCommit {
                id: oid.to_string(),
                author,
                date,
                message,
            })
        });

        Ok(Box::new(commits))
    }

    fn read_file(&self, path: &str) -> Result<Option<String>> {
        let Some(oid) = self.head_oid()? else {
            return Ok(None);
        };

        let tree = self.repo.find_commit(oid)?.tree()?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let blob = entry.to_object(&self.repo)?.peel_to_blob()?;
        Ok(Some(String::from_utf8_lossy(blob.content()).into_owned()))
    }
}
