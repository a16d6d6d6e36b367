//! Domain logic - pure release rules independent of where history comes from

pub mod commit;
pub mod pattern;
pub mod release;
pub mod version;

pub use commit::{classify, ChangeLevel, ReleaseItem};
pub use pattern::{VersionPattern, VersionScheme, DEFAULT_PATTERN};
pub use release::{next_version, sort_by_version, version_key, Release};
pub use version::{Version, FIRST_VERSION};
