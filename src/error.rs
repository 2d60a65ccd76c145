//! Error taxonomy shared by every component.
//!
//! Callers branch on the remote classes (`NotFound`, `RateLimited`,
//! `Transient`) and on the local state errors. Nothing here is retried
//! internally.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Package identifier is not of the form `owner/repo`.
    #[error("invalid package identifier '{input}': {reason} (expected: owner/repo)")]
    InvalidFormat { input: String, reason: &'static str },

    /// The remote reported a missing resource.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote signalled quota exhaustion.
    #[error(
        "GitHub API rate limit exceeded ({0}). \
         Add a GitHub token to ~/.skillmaster/config.json or set GITHUB_TOKEN"
    )]
    RateLimited(String),

    /// Any other remote or network failure.
    #[error("remote request failed: {0}")]
    Transient(String),

    /// The tree walk succeeded but matched nothing.
    #[error("no markdown files found in {0}")]
    NoMarkdownFiles(String),

    /// The tree walk exceeded the configured file cap.
    #[error("{repo} contains more than {limit} markdown files")]
    LimitExceeded { repo: String, limit: usize },

    #[error("manifest file not found: {} (run 'skillmaster init' to create one)", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("manifest already exists: {}", .0.display())]
    ManifestExists(PathBuf),

    #[error("failed to parse {}: {source}", .path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("package not installed: {0}")]
    NotInstalled(String),

    /// A file write failed part-way through an install. `written` files
    /// were already materialized and are left in place.
    #[error("failed to write {} after {written} file(s): {source}", .path.display())]
    Write {
        path: PathBuf,
        written: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings error: {0}")]
    Settings(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Number of files materialized before the failure, for partial installs.
    pub fn files_written(&self) -> usize {
        match self {
            Error::Write { written, .. } => *written,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_message_mentions_credentials() {
        let err = Error::RateLimited("HTTP 403".to_string());
        assert!(err.to_string().contains("GITHUB_TOKEN"));
        assert!(!Error::Transient("boom".to_string())
            .to_string()
            .contains("GITHUB_TOKEN"));
    }

    #[test]
    fn test_files_written_only_for_write_errors() {
        let err = Error::Write {
            path: PathBuf::from("x.md"),
            written: 3,
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(err.files_written(), 3);
        assert_eq!(Error::NotInstalled("o/r".to_string()).files_written(), 0);
    }
}
