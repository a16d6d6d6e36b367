// tests/github_test.rs
mod common;

use chrono::{DateTime, TimeZone, Utc};
use common::{titles, TestRepo};
use git2::{ObjectType, Repository, Sort};
use nextver::config::CONFIG_FILE;
use nextver::error::{NextverError, Result};
use nextver::history::GraphqlTransport;
use nextver::provider::{Provider, ProviderFactory};
use serde_json::{json, Value};
use std::path::PathBuf;

/// Serves GitHub GraphQL answers from a repository on disk
struct RepositoryTransport {
    path: PathBuf,
}

fn iso(time: git2::Time) -> String {
    let date: DateTime<Utc> = Utc.timestamp_opt(time.seconds(), 0).unwrap();
    date.to_rfc3339()
}

impl RepositoryTransport {
    fn repository(value: Value) -> Value {
        json!({ "data": { "repository": value } })
    }

    fn default_branch(repo: &Repository) -> Value {
        let name = repo.head().unwrap().shorthand().unwrap().to_string();
        Self::repository(json!({ "defaultBranchRef": { "name": name } }))
    }

    fn tags(repo: &Repository, count: usize) -> Value {
        let mut nodes: Vec<(i64, Value)> = Vec::new();
        for name in repo.tag_names(None).unwrap().iter().flatten() {
            let object = repo.revparse_single(&format!("refs/tags/{}", name)).unwrap();
            let commit = object.peel_to_commit().unwrap();
            let commit_target = json!({
                "oid": commit.id().to_string(),
                "committedDate": iso(commit.committer().when()),
            });
            let target = match object.kind() {
                Some(ObjectType::Tag) => json!({ "oid": object.id().to_string(), "target": commit_target }),
                _ => commit_target,
            };
            nodes.push((commit.time().seconds(), json!({ "name": name, "target": target })));
        }
        nodes.sort_by_key(|(seconds, _)| *seconds);

        let skipped = nodes.len().saturating_sub(count);
        let nodes: Vec<Value> = nodes.into_iter().skip(skipped).map(|(_, node)| node).collect();
        Self::repository(json!({ "refs": {
            "pageInfo": { "hasPreviousPage": skipped > 0 },
            "nodes": nodes,
        }}))
    }

    fn history(repo: &Repository, expression: &str, count: usize, cursor: Option<&str>) -> Value {
        let start = match repo.revparse_single(expression) {
            Ok(object) => object.peel_to_commit().unwrap().id(),
            Err(_) => return Self::repository(json!({ "object": null })),
        };

        let mut walk = repo.revwalk().unwrap();
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME).unwrap();
        walk.push(start).unwrap();
        let all: Vec<git2::Oid> = walk.map(|oid| oid.unwrap()).collect();

        let offset: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
        let end = (offset + count).min(all.len());
        let nodes: Vec<Value> = all[offset..end]
            .iter()
            .map(|oid| {
                let commit = repo.find_commit(*oid).unwrap();
                json!({
                    "oid": oid.to_string(),
                    "message": commit.message().unwrap(),
                    "author": {
                        "name": commit.author().name().unwrap(),
                        "date": iso(commit.author().when()),
                    },
                })
            })
            .collect();

        Self::repository(json!({ "object": { "history": {
            "pageInfo": { "hasNextPage": end < all.len(), "endCursor": end.to_string() },
            "nodes": nodes,
        }}}))
    }

    fn file(repo: &Repository, expression: &str) -> Value {
        let text = repo
            .revparse_single(expression)
            .ok()
            .and_then(|object| object.peel_to_blob().ok())
            .map(|blob| String::from_utf8_lossy(blob.content()).into_owned());
        match text {
            Some(text) => Self::repository(json!({ "object": { "text": text } })),
            None => Self::repository(json!({ "object": null })),
        }
    }
}

impl GraphqlTransport for RepositoryTransport {
    fn execute(&self, query: &str, variables: Value) -> Result<Value> {
        assert_eq!(variables["owner"], "owner");
        assert_eq!(variables["name"], "repo");

        let repo = Repository::open(&self.path).map_err(|e| NextverError::repository(e.message()))?;
        let count = variables["count"].as_u64().unwrap_or(0) as usize;
        let expression = variables["expression"].as_str().unwrap_or_default();

        let response = if query.contains("defaultBranchRef") {
            Self::default_branch(&repo)
        } else if query.contains("refs(") {
            Self::tags(&repo, count)
        } else if query.contains("history(") {
            Self::history(&repo, expression, count, variables["cursor"].as_str())
        } else if query.contains("Blob") {
            Self::file(&repo, expression)
        } else {
            panic!("unexpected query {}", query);
        };
        Ok(response)
    }
}

fn factory() -> ProviderFactory {
    ProviderFactory::new(Box::new(|| None))
}

fn github(repo: &TestRepo, factory: &ProviderFactory) -> Box<dyn Provider> {
    let transport = RepositoryTransport {
        path: repo.path().to_path_buf(),
    };
    Box::new(factory.github("owner", "repo", Box::new(transport)).unwrap())
}

fn local(repo: &TestRepo, factory: &ProviderFactory) -> Box<dyn Provider> {
    Box::new(factory.local(repo.path()).unwrap())
}

fn sample_repository() -> TestRepo {
    build_sample(TestRepo::new())
}

fn build_sample(mut repo: TestRepo) -> TestRepo {
    repo.commit("Initial commit");
    repo.tag("v0.1.0");
    repo.commit("feat(auth): add login\n\nBREAKING CHANGE: removes old endpoint");
    repo.commit("fix: crash on empty input\r\n\r\nCloses #12");
    repo.annotated_tag("v1.0.0");
    repo.commit("docs: readme");
    repo.commit("refactor(core) : simplify");
    repo.tag("nightly");
    repo.commit("feat: export yaml");
    repo
}

#[test]
fn test_backends_agree_on_every_release() {
    assert_backends_agree(sample_repository());
}

#[test]
fn test_backends_agree_when_timestamps_tie() {
    let repo = build_sample(TestRepo::same_second());
    {
        let github = github(&repo, &factory());
        let release = github.get_release("v1.0.0").unwrap();
        assert_eq!(titles(&release), vec!["crash on empty input", "add login"]);
        let next = github.get_next_release().unwrap();
        assert_eq!(titles(&next), vec!["export yaml", "simplify", "readme"]);
    }
    assert_backends_agree(repo);
}

fn assert_backends_agree(repo: TestRepo) {
    let factory = factory();
    let local = local(&repo, &factory);
    let github = github(&repo, &factory);

    let local_releases = local.get_releases().unwrap();
    let github_releases = github.get_releases().unwrap();
    let refs: Vec<(&str, &str)> = local_releases
        .iter()
        .map(|r| (r.current_version.as_str(), r.r#ref.as_str()))
        .collect();
    let github_refs: Vec<(&str, &str)> = github_releases
        .iter()
        .map(|r| (r.current_version.as_str(), r.r#ref.as_str()))
        .collect();
    assert_eq!(refs, github_refs);

    for name in ["", "v1.0.0", "v0.1.0"] {
        let from_disk = local.get_release(name).unwrap();
        let from_api = github.get_release(name).unwrap();
        assert_eq!(from_disk.changelog, from_api.changelog, "release '{}'", name);
        assert_eq!(from_disk.current_version, from_api.current_version);
        assert_eq!(
            from_disk.next_version().unwrap(),
            from_api.next_version().unwrap()
        );
    }

    assert_eq!(github.project(), "owner/repo");
}

#[test]
fn test_github_changelog_contents() {
    let repo = sample_repository();
    let github = github(&repo, &factory());

    let release = github.get_release("v1.0.0").unwrap();
    assert_eq!(titles(&release), vec!["crash on empty input", "add login"]);
    assert_eq!(release.changelog[0].detail, "Closes #12");
    assert_eq!(release.next_version().unwrap(), "v2.0.0");

    let next = github.get_next_release().unwrap();
    assert_eq!(titles(&next), vec!["export yaml", "simplify", "readme"]);
    assert_eq!(next.next_version().unwrap(), "v1.1.0");
}

#[test]
fn test_github_pagination_and_window() {
    let mut repo = TestRepo::new();
    for i in 0..250 {
        repo.commit(&format!("fix: change {}", i));
    }

    let github = github(&repo, &factory());
    assert_eq!(github.get_next_release().unwrap().changelog.len(), 250);

    let mut small = factory();
    small.commit_window = 120;
    let github = self::github(&repo, &small);
    let next = github.get_next_release().unwrap();
    assert_eq!(next.changelog.len(), 120);
    assert_eq!(next.changelog[0].title, "change 249");
}

#[test]
fn test_github_reads_project_configuration() {
    let mut repo = TestRepo::new();
    repo.commit_file(CONFIG_FILE, "pattern = \"release-SEMVER\"\n", "chore: configure");
    repo.tag("release-2.0.0");
    repo.commit("fix: bug");

    let github = github(&repo, &factory());
    assert_eq!(github.version_pattern().as_str(), "release-SEMVER");
    assert_eq!(
        github.get_next_release().unwrap().next_version().unwrap(),
        "release-2.0.1"
    );
}

#[test]
fn test_github_explicit_branch() {
    let mut repo = TestRepo::new();
    repo.commit("Initial commit");
    repo.tag("v1.0.0");
    repo.branch("develop");
    repo.commit_on("refs/heads/develop", "CHANGES", "develop", "feat: on develop");
    repo.commit("fix: on default branch");

    let factory = factory().with_branch(Some("develop".to_string()));
    let github = github(&repo, &factory);
    assert_eq!(titles(&github.get_next_release().unwrap()), vec!["on develop"]);
}

#[test]
fn test_github_unknown_release() {
    let repo = sample_repository();
    let github = github(&repo, &factory());
    assert!(matches!(
        github.get_release("v3.0.0"),
        Err(NextverError::ReleaseNotFound(_))
    ));
}
