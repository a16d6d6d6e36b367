use chrono::{DateTime, Utc};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Marker that turns any commit into a major change, wherever it appears in the message.
pub const BREAKING_CHANGE_MARKER: &str = "BREAKING CHANGE";

static CONVENTIONAL_HEADER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z_-]+)(\(([^):]+)\))? ?: ?(.*)$").ok());

/// Severity of a single change.
///
/// The discriminants are bit flags so a release window can be summarised by OR-ing levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ChangeLevel {
    #[default]
    Undefined = 0,
    Patch = 1,
    Minor = 2,
    Major = 4,
}

impl ChangeLevel {
    /// Bit contributed to a change mask
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Display name, empty for undefined changes
    pub fn name(self) -> &'static str {
        match self {
            ChangeLevel::Major => "MAJOR",
            ChangeLevel::Minor => "MINOR",
            ChangeLevel::Patch => "PATCH",
            ChangeLevel::Undefined => "",
        }
    }
}

impl fmt::Display for ChangeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One classified commit of a changelog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseItem {
    /// Commit hash, empty when the item was not built from a known commit
    pub id: String,
    pub author: String,
    pub date: DateTime<Utc>,
    /// Lowercased conventional type (`feat`, `fix`, ...), empty for untyped commits
    pub kind: String,
    pub scope: String,
    pub title: String,
    pub detail: String,
    pub level: ChangeLevel,
}

impl ReleaseItem {
    /// Attach the commit hash this item was classified from
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Classify a raw commit message.
///
/// Never fails: a first line that does not look like `kind(scope): title`
/// becomes the title of an untyped, undefined-level item.
pub fn classify(author: &str, date: DateTime<Utc>, message: &str) -> ReleaseItem {
    let (first_line, detail) = match message.split_once('\n') {
        Some((first, rest)) => (first, rest.trim()),
        None => (message, ""),
    };
    let first_line = first_line.strip_suffix('\r').unwrap_or(first_line);

    let header = CONVENTIONAL_HEADER
        .as_ref()
        .and_then(|re| re.captures(first_line));

    let (kind, scope, title) = match header {
        Some(captures) => (
            captures
                .get(1)
                .map(|m| m.as_str().to_lowercase())
                .unwrap_or_default(),
            captures
                .get(3)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            captures
                .get(4)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        ),
        None => (String::new(), String::new(), first_line.trim().to_string()),
    };

    let level = if message.contains(BREAKING_CHANGE_MARKER) {
        ChangeLevel::Major
    } else {
        match kind.as_str() {
            "feat" => ChangeLevel::Minor,
            "fix" => ChangeLevel::Patch,
            _ => ChangeLevel::Undefined,
        }
    };

    ReleaseItem {
        id: String::new(),
        author: author.to_string(),
        date,
        kind,
        scope,
        title,
        detail: detail.to_string(),
        level,
    }
}
