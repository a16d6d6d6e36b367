use thiserror::Error;

/// Unified error type for nextver operations
#[derive(Error, Debug)]
pub enum NextverError {
    #[error("Invalid version pattern '{0}': expected exactly one of SEMVER or DATE")]
    PatternParse(String),

    #[error("Cannot parse version '{0}'")]
    VersionParse(String),

    #[error("Repository access failed: {0}")]
    RepositoryAccess(String),

    #[error("Release not found: {0}")]
    ReleaseNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in nextver
pub type Result<T> = std::result::Result<T, NextverError>;

impl NextverError {
    /// Create a repository access error with context
    pub fn repository(msg: impl Into<String>) -> Self {
        NextverError::RepositoryAccess(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        NextverError::Configuration(msg.into())
    }
}

impl From<git2::Error> for NextverError {
    fn from(err: git2::Error) -> Self {
        NextverError::RepositoryAccess(err.message().to_string())
    }
}

impl From<reqwest::Error> for NextverError {
    fn from(err: reqwest::Error) -> Self {
        NextverError::RepositoryAccess(err.to_string())
    }
}
