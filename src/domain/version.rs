use crate::domain::commit::ChangeLevel;
use crate::error::{NextverError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Version assumed when a repository has never been released
pub const FIRST_VERSION: &str = "0.0.0";

static NUMERIC_VERSION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^v?(\d+)(?:\.(\d+))?(?:\.(\d+))?$").ok());

/// Numeric semantic version.
///
/// Accepts one to three dot-separated components with an optional `v` prefix;
/// missing components are zero, so `1`, `1.0` and `1.0.0` are the same version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string (e.g. "v1.2" -> Version(1,2,0)).
    ///
    /// An empty string is the first version; anything else that is not purely
    /// numeric is rejected with the offending string in the error.
    pub fn parse(version: &str) -> Result<Self> {
        let version = version.trim();
        if version.is_empty() {
            return Ok(Version::default());
        }

        let captures = NUMERIC_VERSION
            .as_ref()
            .and_then(|re| re.captures(version))
            .ok_or_else(|| NextverError::VersionParse(version.to_string()))?;

        let component = |index: usize| -> Result<u64> {
            match captures.get(index) {
                Some(m) => m
                    .as_str()
                    .parse::<u64>()
                    .map_err(|_| NextverError::VersionParse(version.to_string())),
                None => Ok(0),
            }
        };

        Ok(Version {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
        })
    }

    /// Apply the bump implied by a change mask (OR of [`ChangeLevel::bits`]).
    ///
    /// Only the highest level present counts; several breaking changes still
    /// produce a single major increment. A component that cannot be incremented
    /// is a [`NextverError::VersionParse`].
    pub fn bump(&self, mask: u8) -> Result<Self> {
        let increment = |component: u64| {
            component
                .checked_add(1)
                .ok_or_else(|| NextverError::VersionParse(self.to_string()))
        };

        if mask & ChangeLevel::Major.bits() != 0 {
            Ok(Version::new(increment(self.major)?, 0, 0))
        } else if mask & ChangeLevel::Minor.bits() != 0 {
            Ok(Version::new(self.major, increment(self.minor)?, 0))
        } else if mask & ChangeLevel::Patch.bits() != 0 {
            Ok(Version::new(self.major, self.minor, increment(self.patch)?))
        } else {
            Ok(*self)
        }
    }

    /// Same version as a [`semver::Version`], for ordering against other tools
    pub fn to_semver(&self) -> semver::Version {
        semver::Version::new(self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = NextverError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// OR together the levels of a set of changes
pub fn change_mask<'a, I>(levels: I) -> u8
where
    I: IntoIterator<Item = &'a ChangeLevel>,
{
    levels.into_iter().fold(0, |mask, level| mask | level.bits())
}
