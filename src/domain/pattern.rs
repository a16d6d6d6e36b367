use crate::error::{NextverError, Result};
use regex::Regex;
use std::fmt;

/// Token replaced by a numeric semantic version
pub const SEMVER_TOKEN: &str = "SEMVER";
/// Token replaced by a release timestamp
pub const DATE_TOKEN: &str = "DATE";
/// Pattern used when neither the command line nor the config file sets one
pub const DEFAULT_PATTERN: &str = "vSEMVER";
/// chrono format of the `DATE` token (e.g. 2019-06-12-095000)
pub const DATE_FORMAT: &str = "%Y-%m-%d-%H%M%S";

const SEMVER_REGEX: &str = r"v?\d+(?:\.\d+)?(?:\.\d+)?";
const DATE_REGEX: &str = r"\d{4}-\d{2}-\d{2}-\d{6}";

/// How versions of a pattern are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionScheme {
    Semver,
    Date,
}

impl VersionScheme {
    fn token(self) -> &'static str {
        match self {
            VersionScheme::Semver => SEMVER_TOKEN,
            VersionScheme::Date => DATE_TOKEN,
        }
    }

    fn regex(self) -> &'static str {
        match self {
            VersionScheme::Semver => SEMVER_REGEX,
            VersionScheme::Date => DATE_REGEX,
        }
    }
}

/// Version naming pattern (e.g. "vSEMVER", "release-DATE").
///
/// Used both ways: to recognise which tags are releases, and to render a
/// computed version back into a tag name.
#[derive(Debug, Clone)]
pub struct VersionPattern {
    template: String,
    scheme: VersionScheme,
    matcher: Regex,
}

impl VersionPattern {
    /// Compile a pattern holding exactly one `SEMVER` or `DATE` token.
    ///
    /// `SEMVER` takes precedence: when it is present any `DATE` text is a
    /// literal (e.g. `UPDATE-vSEMVER`). A repeated token is rejected.
    pub fn parse(template: &str) -> Result<Self> {
        let semver_count = template.matches(SEMVER_TOKEN).count();
        let date_count = template.matches(DATE_TOKEN).count();

        let scheme = match (semver_count, date_count) {
            (1, _) => VersionScheme::Semver,
            (0, 1) => VersionScheme::Date,
            _ => return Err(NextverError::PatternParse(template.to_string())),
        };

        let (prefix, suffix) = template
            .split_once(scheme.token())
            .ok_or_else(|| NextverError::PatternParse(template.to_string()))?;

        let expression = format!(
            "^{}({}){}$",
            regex::escape(prefix),
            scheme.regex(),
            regex::escape(suffix)
        );
        let matcher =
            Regex::new(&expression).map_err(|_| NextverError::PatternParse(template.to_string()))?;

        Ok(VersionPattern {
            template: template.to_string(),
            scheme,
            matcher,
        })
    }

    /// The raw template string
    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn scheme(&self) -> VersionScheme {
        self.scheme
    }

    /// Whether a tag name is a release of this pattern
    pub fn matches(&self, tag: &str) -> bool {
        self.matcher.is_match(tag)
    }

    /// Version part of a matching tag (e.g. pattern="release-SEMVER", tag="release-1.2" -> "1.2")
    pub fn extract<'t>(&self, tag: &'t str) -> Option<&'t str> {
        self.matcher
            .captures(tag)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
    }

    /// Substitute a computed version for the pattern token
    pub fn render(&self, version: &str) -> String {
        self.template.replace(self.scheme.token(), version)
    }
}

impl PartialEq for VersionPattern {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template
    }
}

impl Eq for VersionPattern {}

impl fmt::Display for VersionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
