//! Release resolution from conventional commits.
//!
//! Tags matching a version pattern (`vSEMVER`, `release-DATE`, ...) split the
//! history of a branch into releases. Commits of a release are classified
//! from their message and summarised into the next version.
//!
//! ```no_run
//! use nextver::provider::{Provider, ProviderFactory};
//!
//! let factory = ProviderFactory::new(Box::new(|| None));
//! let provider = factory.create(".")?;
//! let next = provider.get_next_release()?;
//! println!("{} -> {}", next.current_version, next.next_version()?);
//! # Ok::<(), nextver::NextverError>(())
//! ```

pub mod boundary;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod history;
pub mod provider;
pub mod ui;

pub use error::{NextverError, Result};
