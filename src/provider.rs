//! Release providers
//!
//! A [Provider] answers release questions about one repository. There is a
//! single implementation, [ReleaseProvider], generic over the
//! [HistorySource] it reads, so local and remote repositories go through the
//! same boundary and classification code.

use crate::boundary::{self, ReleaseBoundary};
use crate::config::{resolve_branch, resolve_pattern, Config, Token, TokenSupplier, CONFIG_FILE};
use crate::domain::{classify, Release, ReleaseItem, VersionPattern, FIRST_VERSION};
use crate::error::{NextverError, Result};
use crate::history::github::{DEFAULT_API_URL, DEFAULT_COMMIT_WINDOW, DEFAULT_TIMEOUT};
use crate::history::{
    GithubHistory, GraphqlTransport, HistorySource, HttpTransport, LocalHistory, TagRef,
};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

static GITHUB_LOCATION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?:https://|git@)?github\.com[:/]([A-Za-z0-9-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?/?$")
        .ok()
});

/// Read access to the releases of one repository
pub trait Provider {
    /// Project name, as shown to users
    fn project(&self) -> String;

    /// Pattern deciding which tags are releases
    fn version_pattern(&self) -> &VersionPattern;

    /// Every release tag, newest first, without changelogs
    fn get_releases(&self) -> Result<Vec<Release>>;

    /// Release named `name` with its changelog.
    ///
    /// An empty name selects the next, not yet tagged, release.
    /// An unknown name is [NextverError::ReleaseNotFound].
    fn get_release(&self, name: &str) -> Result<Release>;

    /// Shorthand for `get_release("")`
    fn get_next_release(&self) -> Result<Release> {
        self.get_release("")
    }
}

/// [Provider] over any history source
pub struct ReleaseProvider<S> {
    source: S,
    pattern: VersionPattern,
}

/// Provider over a repository on disk
pub type GitProvider = ReleaseProvider<LocalHistory>;
/// Provider over a GitHub repository
pub type GithubProvider = ReleaseProvider<GithubHistory>;

impl<S: HistorySource> ReleaseProvider<S> {
    pub fn new(source: S, pattern: VersionPattern) -> Self {
        ReleaseProvider { source, pattern }
    }

    fn release_tags(&self) -> Result<Vec<TagRef>> {
        let tags = self.source.tags()?;
        let total = tags.len();
        let releases = boundary::release_tags(tags, &self.pattern);
        debug!(
            total,
            matching = releases.len(),
            pattern = %self.pattern,
            "filtered release tags"
        );
        Ok(releases)
    }

    fn changelog(&self, boundary: &ReleaseBoundary) -> Result<Vec<ReleaseItem>> {
        let walk = self.source.commits(&boundary.from)?;
        let commits = boundary::collect_range(walk, boundary.to.as_deref())?;

        Ok(commits
            .into_iter()
            .map(|c| classify(&c.author, c.date, &c.message).with_id(c.id))
            .collect())
    }

    fn release_of(&self, tag: &TagRef, changelog: Vec<ReleaseItem>) -> Release {
        Release {
            project: self.source.project(),
            r#ref: tag.commit.clone(),
            current_version: tag.name.clone(),
            version_pattern: self.pattern.to_string(),
            changelog,
        }
    }
}

impl<S: HistorySource> Provider for ReleaseProvider<S> {
    fn project(&self) -> String {
        self.source.project()
    }

    fn version_pattern(&self) -> &VersionPattern {
        &self.pattern
    }

    fn get_releases(&self) -> Result<Vec<Release>> {
        Ok(self
            .release_tags()?
            .iter()
            .map(|tag| self.release_of(tag, Vec::new()))
            .collect())
    }

    fn get_release(&self, name: &str) -> Result<Release> {
        let tags = self.release_tags()?;
        let boundary = boundary::resolve(&tags, name)
            .ok_or_else(|| NextverError::ReleaseNotFound(name.to_string()))?;
        let changelog = self.changelog(&boundary)?;

        let release = match (&boundary.tag, &boundary.previous) {
            (Some(tag), _) => self.release_of(tag, changelog),
            (None, Some(latest)) => self.release_of(latest, changelog),
            (None, None) => Release {
                project: self.source.project(),
                r#ref: String::new(),
                current_version: FIRST_VERSION.to_string(),
                version_pattern: self.pattern.to_string(),
                changelog,
            },
        };

        debug!(
            release = if name.is_empty() { "next" } else { name },
            current = %release.current_version,
            changes = release.changelog.len(),
            "resolved release"
        );
        Ok(release)
    }
}

/// Where a repository lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryLocation {
    Github { owner: String, repo: String },
    Local(PathBuf),
}

impl RepositoryLocation {
    /// Recognise GitHub URLs (`github.com/o/r`, `https://…`, `git@…:o/r.git`);
    /// anything else must be an existing path.
    pub fn parse(repo: &str) -> Result<Self> {
        if repo.is_empty() {
            return Err(NextverError::repository("Invalid repository: empty location"));
        }

        if let Some(caps) = GITHUB_LOCATION.as_ref().and_then(|re| re.captures(repo)) {
            return Ok(RepositoryLocation::Github {
                owner: caps[1].to_string(),
                repo: caps[2].to_string(),
            });
        }

        let path = Path::new(repo);
        if !path.exists() {
            return Err(NextverError::repository(format!(
                "Invalid repository {}: no such path",
                repo
            )));
        }

        Ok(RepositoryLocation::Local(path.to_path_buf()))
    }
}

/// Builds providers from a repository location and user settings.
///
/// Settings given here win over the repository's `.nextver.toml`.
pub struct ProviderFactory {
    pub pattern: Option<String>,
    pub branch: Option<String>,
    pub token: TokenSupplier,
    pub api_url: String,
    pub commit_window: usize,
    pub timeout: Duration,
}

impl ProviderFactory {
    pub fn new(token: TokenSupplier) -> Self {
        ProviderFactory {
            pattern: None,
            branch: None,
            token,
            api_url: DEFAULT_API_URL.to_string(),
            commit_window: DEFAULT_COMMIT_WINDOW,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_pattern(mut self, pattern: Option<String>) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    /// Create the provider matching the shape of `repo`
    pub fn create(&self, repo: &str) -> Result<Box<dyn Provider>> {
        match RepositoryLocation::parse(repo)? {
            RepositoryLocation::Github { owner, repo } => {
                let token = (self.token)()
                    .filter(|t| !t.is_empty())
                    .map(Token::new)
                    .ok_or_else(|| {
                        NextverError::config(
                            "A GitHub token is required (--github-token, GITHUB_TOKEN or ~/.config/hub)",
                        )
                    })?;
                debug!(%owner, %repo, %token, "using GitHub repository");

                let transport = HttpTransport::new(self.api_url.clone(), token, self.timeout)?;
                Ok(Box::new(self.github(&owner, &repo, Box::new(transport))?))
            }
            RepositoryLocation::Local(path) => {
                debug!(path = %path.display(), "using local repository");
                Ok(Box::new(self.local(&path)?))
            }
        }
    }

    /// Provider over a repository on disk
    pub fn local(&self, path: &Path) -> Result<GitProvider> {
        let source = LocalHistory::open(path, self.branch.clone())?;
        self.configure(source, |source, branch| Ok(source.with_branch(branch)))
    }

    /// Provider over GitHub, talking through `transport`
    pub fn github(
        &self,
        owner: &str,
        repo: &str,
        transport: Box<dyn GraphqlTransport>,
    ) -> Result<GithubProvider> {
        let source = GithubHistory::connect(owner, repo, transport, self.branch.clone())?
            .with_commit_window(self.commit_window);
        self.configure(source, |source, branch| Ok(source.with_branch(branch)))
    }

    /// Read the project configuration and resolve the pattern and branch once
    fn configure<S, F>(&self, source: S, rebranch: F) -> Result<ReleaseProvider<S>>
    where
        S: HistorySource,
        F: FnOnce(S, String) -> Result<S>,
    {
        let config = match source.read_file(CONFIG_FILE)? {
            Some(content) => Some(Config::from_toml(&content)?),
            None => None,
        };

        let source = match (&self.branch, resolve_branch(None, config.as_ref())) {
            (None, Some(branch)) => {
                debug!(%branch, "branch taken from {}", CONFIG_FILE);
                rebranch(source, branch)?
            }
            _ => source,
        };

        let pattern = VersionPattern::parse(&resolve_pattern(
            self.pattern.as_deref(),
            config.as_ref(),
        ))?;
        debug!(%pattern, "version pattern resolved");

        Ok(ReleaseProvider::new(source, pattern))
    }
}
