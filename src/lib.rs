//! SkillMaster: a package manager for AI assistant markdown files.
//!
//! Packages are GitHub repositories (`owner/repo`). Installing one fetches
//! every visible markdown file from the repository's default branch into
//! `<installDir>/<owner>-<repo>/` and records the resolved version in the
//! project's `skillmaster.json`.
//!
//! ```ignore
//! use skillmaster::{config::Settings, github::GitHubClient, project::Project, PackageId};
//!
//! let settings = Settings::load()?;
//! let client = GitHubClient::new(&settings.github)?;
//! let project = Project::new(std::env::current_dir()?, &client);
//! let report = project.install(&PackageId::parse("octo/prompts")?, false)?;
//! println!("{} file(s) at {}", report.files, report.version);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod installer;
pub mod local;
pub mod locator;
pub mod logging;
pub mod manifest;
pub mod project;

pub use error::{Error, Result};
pub use locator::PackageId;
