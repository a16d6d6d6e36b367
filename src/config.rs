use crate::domain::DEFAULT_PATTERN;
use crate::error::{NextverError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Project configuration file, looked up at the root of the analysed branch
pub const CONFIG_FILE: &str = ".nextver.toml";

/// Location of the hub CLI configuration, relative to the home directory
pub const HUB_CONFIG: &str = ".config/hub";

/// Project-level configuration.
///
/// Every key is optional; command line flags take precedence over it.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Version pattern (e.g. "vSEMVER", "release-DATE")
    #[serde(default)]
    pub pattern: Option<String>,

    /// Branch whose history is released
    #[serde(default)]
    pub branch: Option<String>,
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| NextverError::config(format!("Invalid {}: {}", CONFIG_FILE, e)))
    }
}

/// Pick the effective version pattern.
///
/// Order: explicit flag, then the config file, then [DEFAULT_PATTERN].
/// Empty values count as unset.
pub fn resolve_pattern(flag: Option<&str>, config: Option<&Config>) -> String {
    flag.filter(|p| !p.is_empty())
        .map(str::to_string)
        .or_else(|| {
            config
                .and_then(|c| c.pattern.clone())
                .filter(|p| !p.is_empty())
        })
        .unwrap_or_else(|| DEFAULT_PATTERN.to_string())
}

/// Pick the branch to analyse; `None` means the repository default
pub fn resolve_branch(flag: Option<&str>, config: Option<&Config>) -> Option<String> {
    flag.filter(|b| !b.is_empty())
        .map(str::to_string)
        .or_else(|| {
            config
                .and_then(|c| c.branch.clone())
                .filter(|b| !b.is_empty())
        })
}

/// Show only the first two and last two characters of a secret
pub fn mask_token(token: &str) -> String {
    let len = token.chars().count();
    token
        .chars()
        .enumerate()
        .map(|(pos, c)| if pos < 2 || pos + 2 >= len { c } else { '*' })
        .collect()
}

/// API token whose `Debug` and `Display` output is masked
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Token(token.into())
    }

    /// The secret itself, for authenticating requests only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", mask_token(&self.0))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&mask_token(&self.0))
    }
}

/// Opaque getter for the remote API token
pub type TokenSupplier = Box<dyn Fn() -> Option<String>>;

#[derive(Debug, Deserialize)]
struct HubConfig {
    #[serde(rename = "github.com", default)]
    github: Vec<HubHost>,
}

#[derive(Debug, Deserialize)]
struct HubHost {
    #[serde(default)]
    oauth_token: Option<String>,
}

/// Default hub configuration path (`~/.config/hub`)
pub fn default_hub_config() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(HUB_CONFIG))
}

/// Read the github.com token stored by the hub CLI.
///
/// # Returns
/// * `Ok(Some(token))` - First github.com token found
/// * `Ok(None)` - If the file does not exist or holds no token
/// * `Err` - If the file exists but cannot be read or parsed
pub fn read_hub_token<P: AsRef<Path>>(path: P) -> Result<Option<String>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let hub: HubConfig = serde_yaml::from_str(&content).map_err(|e| {
        NextverError::config(format!("Invalid hub config '{}': {}", path.display(), e))
    })?;

    Ok(hub
        .github
        .into_iter()
        .find_map(|host| host.oauth_token.filter(|t| !t.is_empty())))
}
