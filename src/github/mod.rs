//! Remote repository access.
//!
//! [`RemoteRepository`] is the capability set the installer and the project
//! layer depend on. Implementors supply the raw remote calls; version
//! resolution and the markdown tree walk are provided on top of them so every
//! backend (the GitHub REST client, the in-memory fake used by tests) shares
//! one implementation of those rules.

pub mod http;
#[cfg(test)]
pub mod memory;

pub use http::GitHubClient;

use crate::error::{Error, Result};
use crate::locator::PackageId;

/// Topic every searchable package repository must carry.
pub const PACKAGE_TOPIC: &str = "skillmaster-package";

/// Label used when nothing better can be resolved.
pub const FALLBACK_VERSION: &str = "main";

/// Default cap on matched files per tree walk.
pub const DEFAULT_MAX_FILES: usize = 1000;

/// Repository metadata from a single remote lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    pub owner: String,
    pub name: String,
    pub description: String,
    pub stars: u64,
    /// Last update, `YYYY-MM-DD`
    pub updated_at: Option<String>,
    pub default_branch: String,
}

impl RepositoryInfo {
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Kind of a remote tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

/// One entry of a remote directory listing. `path` is relative to the
/// repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Dir,
        }
    }

    /// Last path segment
    pub fn base_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// A fetched markdown file. `path` keeps the remote directory structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub content: Vec<u8>,
}

/// Case-insensitive `.md` suffix check.
pub fn is_markdown(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".md")
}

/// True if any segment of `path` starts with a dot.
pub fn is_hidden(path: &str) -> bool {
    path.split('/').any(|segment| segment.starts_with('.'))
}

/// Capability set of a remote hosting API.
pub trait RemoteRepository {
    /// Fetch repository metadata. Missing repositories yield `NotFound`.
    fn get_repository(&self, id: &PackageId) -> Result<RepositoryInfo>;

    /// Tag of the latest published release, `None` if there are no releases.
    fn latest_release(&self, id: &PackageId) -> Result<Option<String>>;

    /// Most recent tag as ordered by the remote, `None` if there are no tags.
    fn latest_tag(&self, id: &PackageId) -> Result<Option<String>>;

    /// List the immediate children of `dir` (empty string is the root).
    fn list_directory(&self, id: &PackageId, dir: &str, reference: &str)
        -> Result<Vec<TreeEntry>>;

    /// Fetch and decode one file body.
    fn fetch_file(&self, id: &PackageId, path: &str, reference: &str) -> Result<Vec<u8>>;

    /// Topic-scoped search, most starred first.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<RepositoryInfo>>;

    /// Upper bound on files matched by one tree walk.
    fn max_files(&self) -> usize {
        DEFAULT_MAX_FILES
    }

    /// Resolve a display/manifest version label. Never fails.
    ///
    /// Latest release, then latest tag, then the default branch, then
    /// [`FALLBACK_VERSION`]. Only "does not exist" moves to the next
    /// candidate; a failed release or tag lookup goes straight to the
    /// default branch.
    fn resolve_version(&self, id: &PackageId) -> String {
        match self.latest_release(id) {
            Ok(Some(tag)) => return tag,
            Ok(None) => match self.latest_tag(id) {
                Ok(Some(tag)) => return tag,
                Ok(None) => {}
                Err(e) => tracing::warn!("tag lookup for {id} failed: {e}"),
            },
            Err(e) => tracing::warn!("release lookup for {id} failed: {e}"),
        }

        match self.get_repository(id) {
            Ok(info) if !info.default_branch.is_empty() => info.default_branch,
            Ok(_) => FALLBACK_VERSION.to_string(),
            Err(e) => {
                tracing::warn!("metadata lookup for {id} failed, using '{FALLBACK_VERSION}': {e}");
                FALLBACK_VERSION.to_string()
            }
        }
    }

    /// Walk the tree at `reference` and fetch every visible markdown file.
    ///
    /// Hidden entries are skipped, and a hidden directory prunes its subtree.
    /// Any listing or fetch failure aborts the whole walk.
    fn list_markdown_files(&self, id: &PackageId, reference: &str) -> Result<Vec<RemoteFile>> {
        let limit = self.max_files();
        let mut matched = Vec::new();
        let mut pending = vec![String::new()];

        while let Some(dir) = pending.pop() {
            tracing::debug!("listing {id}:{dir} at {reference}");
            for entry in self.list_directory(id, &dir, reference)? {
                if is_hidden(&entry.path) {
                    continue;
                }
                match entry.kind {
                    EntryKind::Dir => pending.push(entry.path),
                    EntryKind::File if is_markdown(entry.base_name()) => {
                        matched.push(entry.path);
                        if matched.len() > limit {
                            return Err(Error::LimitExceeded {
                                repo: id.key(),
                                limit,
                            });
                        }
                    }
                    _ => {}
                }
            }
        }

        if matched.is_empty() {
            return Err(Error::NoMarkdownFiles(id.key()));
        }

        matched
            .into_iter()
            .map(|path| {
                let content = self.fetch_file(id, &path, reference)?;
                Ok(RemoteFile { path, content })
            })
            .collect()
    }
}
