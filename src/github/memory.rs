//! In-memory remote used by tests. No network.

use super::{RemoteRepository, RepositoryInfo, TreeEntry, DEFAULT_MAX_FILES};
use crate::error::{Error, Result};
use crate::locator::PackageId;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct FakeRepo {
    info: RepositoryInfo,
    release: Option<String>,
    tags: Vec<String>,
    files: BTreeMap<String, Vec<u8>>,
    fail_metadata: bool,
    fail_releases: bool,
    fail_fetch: Option<String>,
}

impl FakeRepo {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            info: RepositoryInfo {
                owner: owner.to_string(),
                name: name.to_string(),
                description: String::new(),
                stars: 0,
                updated_at: None,
                default_branch: "main".to_string(),
            },
            release: None,
            tags: Vec::new(),
            files: BTreeMap::new(),
            fail_metadata: false,
            fail_releases: false,
            fail_fetch: None,
        }
    }

    pub fn default_branch(mut self, branch: &str) -> Self {
        self.info.default_branch = branch.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.info.description = description.to_string();
        self
    }

    pub fn stars(mut self, stars: u64) -> Self {
        self.info.stars = stars;
        self
    }

    pub fn release(mut self, tag: &str) -> Self {
        self.release = Some(tag.to_string());
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.files
            .insert(path.to_string(), content.as_bytes().to_vec());
        self
    }

    pub fn failing_metadata(mut self) -> Self {
        self.fail_metadata = true;
        self
    }

    pub fn failing_releases(mut self) -> Self {
        self.fail_releases = true;
        self
    }

    /// Listing still shows `path`, but fetching it reports `NotFound`.
    pub fn failing_fetch(mut self, path: &str) -> Self {
        self.fail_fetch = Some(path.to_string());
        self
    }
}

/// Fake remote holding a set of repositories.
#[derive(Debug)]
pub struct InMemoryRemote {
    repos: HashMap<String, FakeRepo>,
    max_files: usize,
    rate_limited: bool,
    fetches: Cell<usize>,
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self {
            repos: HashMap::new(),
            max_files: DEFAULT_MAX_FILES,
            rate_limited: false,
            fetches: Cell::new(0),
        }
    }

    pub fn with_repo(mut self, repo: FakeRepo) -> Self {
        self.repos.insert(repo.info.key(), repo);
        self
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// Every call reports quota exhaustion.
    pub fn rate_limited(mut self) -> Self {
        self.rate_limited = true;
        self
    }

    /// Number of file body fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }

    fn repo(&self, id: &PackageId) -> Result<&FakeRepo> {
        if self.rate_limited {
            return Err(Error::RateLimited("HTTP 403".to_string()));
        }
        self.repos
            .get(&id.key())
            .ok_or_else(|| Error::NotFound(format!("repository {id}")))
    }
}

impl RemoteRepository for InMemoryRemote {
    fn get_repository(&self, id: &PackageId) -> Result<RepositoryInfo> {
        let repo = self.repo(id)?;
        if repo.fail_metadata {
            return Err(Error::Transient("connection reset".to_string()));
        }
        Ok(repo.info.clone())
    }

    fn latest_release(&self, id: &PackageId) -> Result<Option<String>> {
        let repo = self.repo(id)?;
        if repo.fail_releases {
            return Err(Error::Transient("HTTP 502".to_string()));
        }
        Ok(repo.release.clone())
    }

    fn latest_tag(&self, id: &PackageId) -> Result<Option<String>> {
        Ok(self.repo(id)?.tags.last().cloned())
    }

    fn list_directory(
        &self,
        id: &PackageId,
        dir: &str,
        _reference: &str,
    ) -> Result<Vec<TreeEntry>> {
        let repo = self.repo(id)?;
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        let mut dirs = BTreeSet::new();
        let mut entries = Vec::new();
        for path in repo.files.keys() {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((child, _)) => {
                    dirs.insert(format!("{prefix}{child}"));
                }
                None => entries.push(TreeEntry::file(path.clone())),
            }
        }
        entries.extend(dirs.into_iter().map(TreeEntry::dir));

        if entries.is_empty() && !dir.is_empty() {
            return Err(Error::NotFound(format!("path {dir}")));
        }
        Ok(entries)
    }

    fn fetch_file(&self, id: &PackageId, path: &str, _reference: &str) -> Result<Vec<u8>> {
        let repo = self.repo(id)?;
        if repo.fail_fetch.as_deref() == Some(path) {
            return Err(Error::NotFound(format!("file {path}")));
        }
        self.fetches.set(self.fetches.get() + 1);
        repo.files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("file {path}")))
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<RepositoryInfo>> {
        if self.rate_limited {
            return Err(Error::RateLimited("HTTP 403".to_string()));
        }
        let query = query.to_lowercase();
        let mut found: Vec<RepositoryInfo> = self
            .repos
            .values()
            .map(|r| r.info.clone())
            .filter(|info| {
                query.split_whitespace().all(|word| {
                    info.name.to_lowercase().contains(word)
                        || info.description.to_lowercase().contains(word)
                })
            })
            .collect();
        found.sort_by(|a, b| b.stars.cmp(&a.stars));
        found.truncate(limit);
        Ok(found)
    }

    fn max_files(&self) -> usize {
        self.max_files
    }
}
