use crate::domain::commit::ReleaseItem;
use crate::domain::pattern::{VersionPattern, VersionScheme, DATE_FORMAT};
use crate::domain::version::{change_mask, Version};
use crate::error::Result;
use chrono::{Local, NaiveDateTime};
use std::cmp::Reverse;

/// One resolved release boundary and the changes it contains
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Release {
    pub project: String,
    /// Commit the release is anchored on, empty when there is none
    pub r#ref: String,
    pub current_version: String,
    pub version_pattern: String,
    /// Newest first; empty when only release metadata was requested
    pub changelog: Vec<ReleaseItem>,
}

impl Release {
    /// Next version of this release, dated with the local wall clock
    pub fn next_version(&self) -> Result<String> {
        self.next_version_at(Local::now().naive_local())
    }

    /// Next version of this release with an explicit clock reading
    pub fn next_version_at(&self, now: NaiveDateTime) -> Result<String> {
        next_version(
            &self.current_version,
            &self.version_pattern,
            &self.changelog,
            now,
        )
    }
}

/// Compute the version that follows `current_version` given a set of changes.
///
/// Semver patterns bump the highest change level found in `changes`; date
/// patterns ignore the changes and stamp `now`.
pub fn next_version(
    current_version: &str,
    version_pattern: &str,
    changes: &[ReleaseItem],
    now: NaiveDateTime,
) -> Result<String> {
    let pattern = VersionPattern::parse(version_pattern)?;

    match pattern.scheme() {
        VersionScheme::Semver => {
            let current_version = current_version.trim();
            let numeric = pattern
                .extract(current_version)
                .unwrap_or(current_version);
            let current = Version::parse(numeric)?;
            let mask = change_mask(changes.iter().map(|item| &item.level));
            tracing::debug!(%current, mask, pattern = %pattern, "computing next semver");
            Ok(pattern.render(&current.bump(mask)?.to_string()))
        }
        VersionScheme::Date => Ok(pattern.render(&now.format(DATE_FORMAT).to_string())),
    }
}

/// Ordering key of a version string read through `pattern`.
///
/// Parsed numeric versions compare above anything unparsable; the raw text
/// breaks ties, which also orders `DATE` versions chronologically.
pub fn version_key(pattern: &VersionPattern, version: &str) -> (Option<semver::Version>, String) {
    let current = version.trim();
    let numeric = pattern.extract(current).unwrap_or(current);
    let parsed = Version::parse(numeric).ok().map(|v| v.to_semver());
    (parsed, version.to_string())
}

/// Order releases by version, highest first.
///
/// Versions are read through `pattern`; releases whose version cannot be
/// parsed go last, in reverse lexical order.
pub fn sort_by_version(releases: &mut [Release], pattern: &VersionPattern) {
    releases.sort_by_cached_key(|release| Reverse(version_key(pattern, &release.current_version)));
}
