//! GitHub repository history over the GraphQL API
//!
//! Queries can be tried out in the GitHub GraphQL explorer. Only a bounded
//! window of the remote history is read: the last [TAG_WINDOW] tags and at most
//! `commit_window` commits per walk (see [DEFAULT_COMMIT_WINDOW]). Hitting
//! either bound is reported with a warning.

use crate::boundary::BoundaryWarning;
use crate::config::Token;
use crate::error::{NextverError, Result};
use crate::history::{Anchor, CommitIter, HistorySource, RawCommit, TagRef};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, warn};

/// Public GitHub GraphQL endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com/graphql";
/// Number of most recent tags read from the API
pub const TAG_WINDOW: usize = 100;
/// Commits fetched per history request
pub const PAGE_SIZE: usize = 100;
/// Default bound on commits read by one history walk
pub const DEFAULT_COMMIT_WINDOW: usize = 1000;
/// Default HTTP timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const TAGS_QUERY: &str = r#"
query($owner: String!, $name: String!, $count: Int!) {
  repository(owner: $owner, name: $name) {
    refs(refPrefix: "refs/tags/", last: $count, orderBy: {field: TAG_COMMIT_DATE, direction: ASC}) {
      pageInfo { hasPreviousPage }
      nodes {
        name
        target {
          oid
          ... on Commit { committedDate }
          ... on Tag { target { oid ... on Commit { committedDate } } }
        }
      }
    }
  }
}"#;

const DEFAULT_BRANCH_QUERY: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    defaultBranchRef { name }
  }
}"#;

const HISTORY_QUERY: &str = r#"
query($owner: String!, $name: String!, $expression: String!, $count: Int!, $cursor: String) {
  repository(owner: $owner, name: $name) {
    object(expression: $expression) {
      ... on Commit {
        history(first: $count, after: $cursor) {
          pageInfo { hasNextPage endCursor }
          nodes { oid message author { name date } }
        }
      }
    }
  }
}"#;

const FILE_QUERY: &str = r#"
query($owner: String!, $name: String!, $expression: String!) {
  repository(owner: $owner, name: $name) {
    object(expression: $expression) {
      ... on Blob { text }
    }
  }
}"#;

/// Executes one GraphQL request and returns the raw JSON response body
pub trait GraphqlTransport {
    fn execute(&self, query: &str, variables: Value) -> Result<Value>;
}

/// GraphQL over HTTPS with bearer authentication
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: Token,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, token: Token, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nextver/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpTransport {
            client,
            endpoint: endpoint.into(),
            token,
        })
    }
}

impl GraphqlTransport for HttpTransport {
    fn execute(&self, query: &str, variables: Value) -> Result<Value> {
        debug!(endpoint = %self.endpoint, token = %self.token, "graphql request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.token.expose())
            .json(&json!({ "query": query, "variables": variables }))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(NextverError::repository(format!(
                "GitHub API returned {}: {}",
                status,
                body.trim()
            )));
        }

        Ok(response.json()?)
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryData<T> {
    repository: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TagsRepository {
    refs: TagRefs,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagRefs {
    page_info: TagPageInfo,
    nodes: Vec<TagNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagPageInfo {
    has_previous_page: bool,
}

#[derive(Debug, Deserialize)]
struct TagNode {
    name: String,
    target: TagTarget,
}

/// Either a commit (lightweight tag) or an annotated tag wrapping one
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagTarget {
    oid: String,
    #[serde(default)]
    committed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    target: Option<Box<TagTarget>>,
}

impl TagTarget {
    fn commit(&self) -> Option<(&str, DateTime<Utc>)> {
        match (&self.committed_date, &self.target) {
            (Some(date), _) => Some((self.oid.as_str(), *date)),
            (None, Some(inner)) => inner.commit(),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BranchRepository {
    default_branch_ref: Option<BranchRef>,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ObjectRepository<T> {
    object: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CommitObject {
    #[serde(default)]
    history: Option<CommitHistory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitHistory {
    page_info: HistoryPageInfo,
    nodes: Vec<CommitNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryPageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitNode {
    oid: String,
    message: String,
    #[serde(default)]
    author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct BlobObject {
    #[serde(default)]
    text: Option<String>,
}

struct HistoryPage {
    commits: Vec<RawCommit>,
    has_next: bool,
    end_cursor: Option<String>,
}

/// History of one branch of a GitHub repository
pub struct GithubHistory {
    transport: Box<dyn GraphqlTransport>,
    owner: String,
    repo: String,
    branch: String,
    commit_window: usize,
}

impl GithubHistory {
    /// Connect to `owner/repo`.
    ///
    /// Without a branch, the repository default branch is queried once here.
    pub fn connect(
        owner: &str,
        repo: &str,
        transport: Box<dyn GraphqlTransport>,
        branch: Option<String>,
    ) -> Result<Self> {
        if owner.is_empty() || repo.is_empty() {
            return Err(NextverError::config(
                "GitHub owner and repository name are required",
            ));
        }

        let mut history = GithubHistory {
            transport,
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.unwrap_or_default(),
            commit_window: DEFAULT_COMMIT_WINDOW,
        };

        if history.branch.is_empty() {
            history.branch = history.default_branch()?;
            debug!(branch = %history.branch, "using repository default branch");
        }

        Ok(history)
    }

    /// Bound the number of commits a single history walk may read
    pub fn with_commit_window(mut self, commit_window: usize) -> Self {
        self.commit_window = commit_window.max(1);
        self
    }

    /// Walk `branch` instead of the one chosen at connection
    pub fn with_branch(mut self, branch: String) -> Self {
        self.branch = branch;
        self
    }

    /// Branch whose history is walked
    pub fn branch(&self) -> &str {
        &self.branch
    }

    fn query<T: DeserializeOwned>(&self, query: &str, mut variables: Value) -> Result<T> {
        variables["owner"] = json!(self.owner);
        variables["name"] = json!(self.repo);

        let body = self.transport.execute(query, variables)?;
        let response: GraphqlResponse<RepositoryData<T>> = serde_json::from_value(body)
            .map_err(|e| NextverError::repository(format!("Unexpected GitHub response: {}", e)))?;

        if !response.errors.is_empty() {
            let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
            return Err(NextverError::repository(messages.join("; ")));
        }

        response
            .data
            .and_then(|data| data.repository)
            .ok_or_else(|| {
                NextverError::repository(format!(
                    "Repository {}/{} not found",
                    self.owner, self.repo
                ))
            })
    }

    fn default_branch(&self) -> Result<String> {
        let repository: BranchRepository = self.query(DEFAULT_BRANCH_QUERY, json!({}))?;
        repository
            .default_branch_ref
            .map(|b| b.name)
            .ok_or_else(|| {
                NextverError::repository(format!(
                    "Repository {}/{} has no default branch",
                    self.owner, self.repo
                ))
            })
    }

    fn fetch_page(&self, expression: &str, cursor: Option<&str>) -> Result<HistoryPage> {
        let repository: ObjectRepository<CommitObject> = self.query(
            HISTORY_QUERY,
            json!({ "expression": expression, "count": PAGE_SIZE, "cursor": cursor }),
        )?;

        let history = repository
            .object
            .and_then(|object| object.history)
            .ok_or_else(|| {
                NextverError::repository(format!("Cannot resolve commit '{}'", expression))
            })?;

        let commits = history
            .nodes
            .into_iter()
            .map(|node| {
                let (author, date) = match node.author {
                    Some(author) => (
                        author.name.unwrap_or_else(|| "unknown".to_string()),
                        author.date.unwrap_or_default(),
                    ),
                    None => ("unknown".to_string(), DateTime::<Utc>::default()),
                };
                RawCommit {
                    id: node.oid,
                    author,
                    date,
                    message: node.message,
                }
            })
            .collect();

        Ok(HistoryPage {
            commits,
            has_next: history.page_info.has_next_page,
            end_cursor: history.page_info.end_cursor,
        })
    }
}

impl HistorySource for GithubHistory {
    fn project(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn tags(&self) -> Result<Vec<TagRef>> {
        let repository: TagsRepository =
            self.query(TAGS_QUERY, json!({ "count": TAG_WINDOW }))?;

        if repository.refs.page_info.has_previous_page {
            warn!(
                "{}",
                BoundaryWarning::TagWindowExhausted {
                    window: TAG_WINDOW
                }
            );
        }

        let tags = repository
            .refs
            .nodes
            .iter()
            .rev()
            .filter_map(|node| match node.target.commit() {
                Some((oid, date)) => Some(TagRef::new(node.name.clone(), oid, date)),
                None => {
                    debug!(tag = %node.name, "skipping tag not pointing at a commit");
                    None
                }
            })
            .collect();

        Ok(tags)
    }

    fn commits(&self, from: &Anchor) -> Result<CommitIter<'_>> {
        let expression = match from {
            Anchor::Head => format!("refs/heads/{}", self.branch),
            Anchor::Commit(id) => id.clone(),
        };

        Ok(Box::new(HistoryPages {
            source: self,
            expression,
            cursor: None,
            buffer: VecDeque::new(),
            has_next: true,
            yielded: 0,
        }))
    }

    fn read_file(&self, path: &str) -> Result<Option<String>> {
        let expression = format!("{}:{}", self.branch, path);
        let repository: ObjectRepository<BlobObject> =
            self.query(FILE_QUERY, json!({ "expression": expression }))?;

        Ok(repository
            .object
            .and_then(|blob| blob.text)
            .filter(|text| !text.is_empty()))
    }
}

/// Lazily paginated history walk
struct HistoryPages<'a> {
    source: &'a GithubHistory,
    expression: String,
    cursor: Option<String>,
    buffer: VecDeque<RawCommit>,
    has_next: bool,
    yielded: usize,
}

impl Iterator for HistoryPages<'_> {
    type Item = Result<RawCommit>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.yielded >= self.source.commit_window {
            if !self.buffer.is_empty() || self.has_next {
                warn!(
                    "{}",
                    BoundaryWarning::HistoryWindowExhausted {
                        window: self.source.commit_window
                    }
                );
                self.buffer.clear();
                self.has_next = false;
            }
            return None;
        }

        if self.buffer.is_empty() && self.has_next {
            match self
                .source
                .fetch_page(&self.expression, self.cursor.as_deref())
            {
                Ok(page) => {
                    self.has_next = page.has_next && page.end_cursor.is_some();
                    self.cursor = page.end_cursor;
                    self.buffer.extend(page.commits);
                }
                Err(e) => {
                    self.has_next = false;
                    return Some(Err(e));
                }
            }
        }

        let commit = self.buffer.pop_front()?;
        self.yielded += 1;
        Some(Ok(commit))
    }
}
