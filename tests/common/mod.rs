// tests/common/mod.rs
#![allow(dead_code)]

use git2::{Oid, Repository, Signature, Time};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Throw-away repository with a deterministic commit clock
pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
    clock: i64,
    step: i64,
}

impl TestRepo {
    /// Commits one hour apart
    pub fn new() -> Self {
        Self::with_step(3600)
    }

    /// Every commit and tag in the same second, as scripted or rebased history has
    pub fn same_second() -> Self {
        Self::with_step(0)
    }

    fn with_step(step: i64) -> Self {
        let dir = TempDir::new().expect("Could not create temp dir");
        let repo = Repository::init(dir.path()).expect("Could not init git repo");
        TestRepo {
            dir,
            repo,
            clock: 1_560_000_000,
            step,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn path_str(&self) -> &str {
        self.dir.path().to_str().expect("temp path is not UTF-8")
    }

    fn signature(&mut self) -> Signature<'static> {
        self.clock += self.step;
        Signature::new("Test User", "test@example.com", &Time::new(self.clock, 0))
            .expect("Could not build signature")
    }

    /// Commit on the current branch
    pub fn commit(&mut self, message: &str) -> Oid {
        self.commit_on("HEAD", "CHANGES", message, message)
    }

    /// Commit a file on the current branch
    pub fn commit_file(&mut self, path: &str, content: &str, message: &str) -> Oid {
        self.commit_on("HEAD", path, content, message)
    }

    /// Commit on `reference` (e.g. "refs/heads/develop"), parented on its tip
    pub fn commit_on(&mut self, reference: &str, path: &str, content: &str, message: &str) -> Oid {
        let signature = self.signature();
        let file = self.dir.path().join(path);
        fs::write(&file, content).expect("Could not write file");

        let mut index = self.repo.index().expect("Could not get index");
        index
            .add_path(Path::new(path))
            .expect("Could not add file to index");
        index.write().expect("Could not write index");
        let tree_id = index.write_tree().expect("Could not write tree");
        let tree = self.repo.find_tree(tree_id).expect("Could not find tree");

        let parent = self
            .repo
            .find_reference(reference)
            .and_then(|r| r.peel_to_commit())
            .ok();
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(
                Some(reference),
                &signature,
                &signature,
                message,
                &tree,
                &parents,
            )
            .expect("Could not create commit")
    }

    /// Lightweight tag on HEAD
    pub fn tag(&self, name: &str) {
        let head = self.head();
        self.repo
            .tag_lightweight(name, head.as_object(), false)
            .expect("Could not create tag");
    }

    /// Annotated tag on HEAD
    pub fn annotated_tag(&mut self, name: &str) {
        let signature = self.signature();
        let head = self.head();
        self.repo
            .tag(name, head.as_object(), &signature, "release", false)
            .expect("Could not create annotated tag");
    }

    /// Create `name` at HEAD without checking it out
    pub fn branch(&self, name: &str) {
        let head = self.head();
        self.repo
            .branch(name, &head, false)
            .expect("Could not create branch");
    }

    pub fn head(&self) -> git2::Commit<'_> {
        self.repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .expect("Repository has no HEAD commit")
    }

    /// Name of the checked out branch
    pub fn head_branch(&self) -> String {
        self.repo
            .head()
            .ok()
            .and_then(|h| h.shorthand().map(str::to_string))
            .expect("HEAD is not a branch")
    }
}

/// Titles of a changelog, newest first
pub fn titles(release: &nextver::domain::Release) -> Vec<String> {
    release.changelog.iter().map(|i| i.title.clone()).collect()
}
