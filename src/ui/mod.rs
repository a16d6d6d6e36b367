//! User interface module - output models and rendering.
//!
//! Separates concerns:
//! - `formatter` - Console rendering and error display
//! - This module - Serializable views of releases and format dispatch

use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Release, ReleaseItem};

pub mod formatter;

pub use formatter::{
    display_boundary_warning, display_error, format_changelog, format_releases,
};

/// Output format of every subcommand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "console" => Ok(OutputFormat::Console),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            other => Err(anyhow::anyhow!(
                "Unknown output format '{}' (expected console, json or yaml)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseItemDto {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scope: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
    pub level: String,
    pub author: String,
    pub date: DateTime<Utc>,
}

impl From<&ReleaseItem> for ReleaseItemDto {
    fn from(item: &ReleaseItem) -> Self {
        ReleaseItemDto {
            id: item.id.clone(),
            kind: item.kind.clone(),
            scope: item.scope.clone(),
            title: item.title.clone(),
            detail: item.detail.clone(),
            level: item.level.name().to_string(),
            author: item.author.clone(),
            date: item.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseDto {
    pub project: String,
    #[serde(rename = "ref", skip_serializing_if = "String::is_empty")]
    pub r#ref: String,
    pub current_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_version: Option<String>,
    pub version_pattern: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changelog: Vec<ReleaseItemDto>,
}

impl ReleaseDto {
    /// View of a release; `next_version` is only known for resolved releases
    pub fn new(release: &Release, next_version: Option<String>) -> Self {
        ReleaseDto {
            project: release.project.clone(),
            r#ref: release.r#ref.clone(),
            current_version: release.current_version.clone(),
            next_version,
            version_pattern: release.version_pattern.clone(),
            changelog: release.changelog.iter().map(ReleaseItemDto::from).collect(),
        }
    }
}

#[derive(Serialize)]
struct NextVersionDto<'a> {
    next_version: &'a str,
}

fn serialize<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<Option<String>> {
    match format {
        OutputFormat::Console => Ok(None),
        OutputFormat::Json => Ok(Some(serde_json::to_string_pretty(value)? + "\n")),
        OutputFormat::Yaml => Ok(Some(serde_yaml::to_string(value)?)),
    }
}

/// Render the next version alone
pub fn render_next_version(version: &str, format: OutputFormat) -> Result<String> {
    Ok(serialize(&NextVersionDto { next_version: version }, format)?
        .unwrap_or_else(|| format!("{}\n", version)))
}

/// Render one release with its changelog
pub fn render_release(release: &ReleaseDto, format: OutputFormat, color: bool) -> Result<String> {
    Ok(serialize(release, format)?.unwrap_or_else(|| format_changelog(release, color)))
}

/// Render a list of releases
pub fn render_releases(releases: &[ReleaseDto], format: OutputFormat) -> Result<String> {
    Ok(serialize(releases, format)?.unwrap_or_else(|| format_releases(releases)))
}
