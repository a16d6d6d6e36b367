//! Command line interface: argument model and subcommand dispatch

use std::io::Write;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::boundary::BoundaryWarning;
use crate::config::{default_hub_config, read_hub_token, TokenSupplier};
use crate::domain::{sort_by_version, Release};
use crate::history::github::{DEFAULT_API_URL, DEFAULT_COMMIT_WINDOW, DEFAULT_TIMEOUT};
use crate::provider::{Provider, ProviderFactory};
use crate::ui::{self, OutputFormat, ReleaseDto};

#[derive(Debug, Parser)]
#[command(
    name = "nextver",
    version,
    about = "Compute the next version and changelog of a repository from conventional commits"
)]
pub struct Args {
    #[arg(
        short,
        long,
        global = true,
        default_value = ".",
        help = "Local path or GitHub URL (github.com/owner/repo)"
    )]
    pub repo: String,

    #[arg(
        short,
        long,
        global = true,
        help = "Version pattern containing SEMVER or DATE [default: vSEMVER]"
    )]
    pub pattern: Option<String>,

    #[arg(
        short,
        long,
        global = true,
        help = "Branch to analyse [default: repository default branch]"
    )]
    pub branch: Option<String>,

    #[arg(
        long,
        global = true,
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        help = "GitHub token, falls back to ~/.config/hub"
    )]
    pub github_token: Option<String>,

    #[arg(long, global = true, default_value = DEFAULT_API_URL, hide = true)]
    pub github_api_url: String,

    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_COMMIT_WINDOW,
        help = "Maximum number of commits read from GitHub per release"
    )]
    pub commit_window: usize,

    #[arg(
        short,
        long,
        global = true,
        default_value = "console",
        help = "Output format (console, json, yaml)"
    )]
    pub output: OutputFormat,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,

    #[arg(short, long, global = true, help = "Log debug information to stderr")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the next version (default)
    Next,
    /// Show the current version, next version and changelog of a release
    Changelog {
        #[arg(long, help = "Release tag to describe [default: next release]")]
        release: Option<String>,
    },
    /// List releases, newest first
    Releases {
        #[arg(long, help = "Sort by version number instead of tag date")]
        sort_by_version: bool,
    },
}

/// Token from the flag or environment, then from the hub configuration
pub fn token_supplier(flag: Option<String>) -> TokenSupplier {
    Box::new(move || {
        if let Some(token) = flag.clone().filter(|t| !t.is_empty()) {
            return Some(token);
        }
        let path = default_hub_config()?;
        read_hub_token(&path).unwrap_or_else(|e| {
            warn!("Ignoring hub configuration: {}", e);
            None
        })
    })
}

impl Args {
    fn factory(&self) -> ProviderFactory {
        ProviderFactory {
            pattern: self.pattern.clone(),
            branch: self.branch.clone(),
            token: token_supplier(self.github_token.clone()),
            api_url: self.github_api_url.clone(),
            commit_window: self.commit_window,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    fn color(&self) -> bool {
        !self.no_color && console::colors_enabled()
    }
}

/// Run the selected subcommand, writing its result to `out`
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<()> {
    let provider = args
        .factory()
        .create(&args.repo)
        .with_context(|| format!("Cannot read releases of '{}'", args.repo))?;

    let rendered = match args.command.clone().unwrap_or(Command::Next) {
        Command::Next => {
            let release = provider.get_next_release()?;
            warn_if_unchanged(&release);
            ui::render_next_version(&release.next_version()?, args.output)?
        }
        Command::Changelog { release } => {
            let name = release.unwrap_or_default();
            let release = provider.get_release(&name)?;
            if name.is_empty() {
                warn_if_unchanged(&release);
            }
            let next = release.next_version()?;
            ui::render_release(&ReleaseDto::new(&release, Some(next)), args.output, args.color())?
        }
        Command::Releases { sort_by_version } => {
            let releases = list_releases(provider.as_ref(), sort_by_version)?;
            let dtos: Vec<ReleaseDto> = releases.iter().map(|r| ReleaseDto::new(r, None)).collect();
            ui::render_releases(&dtos, args.output)?
        }
    };

    out.write_all(rendered.as_bytes())?;
    out.flush()?;
    Ok(())
}

fn list_releases(provider: &dyn Provider, by_version: bool) -> Result<Vec<Release>> {
    let mut releases = provider.get_releases()?;
    if by_version {
        sort_by_version(&mut releases, provider.version_pattern());
    }
    Ok(releases)
}

fn warn_if_unchanged(release: &Release) {
    if release.changelog.is_empty() && !release.r#ref.is_empty() {
        ui::display_boundary_warning(&BoundaryWarning::NoNewCommits {
            latest_tag: release.current_version.clone(),
            current_commit_hash: release.r#ref.clone(),
        });
    }
}
