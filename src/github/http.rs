//! GitHub REST v3 implementation of [`RemoteRepository`].

use super::{EntryKind, RemoteRepository, RepositoryInfo, TreeEntry, PACKAGE_TOPIC};
use crate::config::GitHubSettings;
use crate::error::{Error, Result};
use crate::locator::PackageId;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Request timeout for every API call (30 seconds).
const REQUEST_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("skillmaster/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct RepoOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    owner: RepoOwner,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    default_branch: Option<String>,
}

impl From<RepoResponse> for RepositoryInfo {
    fn from(repo: RepoResponse) -> Self {
        RepositoryInfo {
            owner: repo.owner.login,
            name: repo.name,
            description: repo.description.unwrap_or_default(),
            stars: repo.stargazers_count,
            updated_at: repo.updated_at.as_deref().and_then(format_date),
            default_branch: repo.default_branch.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    tag_name: Option<String>,
}

/// Tag of a release lookup; a missing release or a blank tag is `None`.
fn release_tag(release: Option<ReleaseResponse>) -> Option<String> {
    release.and_then(|r| r.tag_name).filter(|t| !t.is_empty())
}

#[derive(Debug, Deserialize)]
struct TagResponse {
    name: Option<String>,
}

/// First tag in remote order; an empty list is `None`.
fn first_tag(tags: Vec<TagResponse>) -> Option<String> {
    tags.into_iter()
        .next()
        .and_then(|t| t.name)
        .filter(|t| !t.is_empty())
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    #[serde(rename = "type")]
    kind: String,
    path: String,
}

impl From<ContentEntry> for TreeEntry {
    fn from(entry: ContentEntry) -> Self {
        let kind = match entry.kind.as_str() {
            "file" => EntryKind::File,
            "dir" => EntryKind::Dir,
            // symlink, submodule
            _ => EntryKind::Other,
        };
        TreeEntry {
            path: entry.path,
            kind,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<RepoResponse>,
}

/// Format an ISO-8601 timestamp as `YYYY-MM-DD`.
fn format_date(timestamp: &str) -> Option<String> {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Map a non-success status to the error class callers branch on.
fn status_error(status: StatusCode, what: &str) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(what.to_string()),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            Error::RateLimited(format!("HTTP {} for {}", status.as_u16(), what))
        }
        _ => Error::Transient(format!("HTTP {} for {}", status, what)),
    }
}

/// A 404 means "does not exist"; every other outcome passes through.
fn not_found_as_none<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Decode a contents-API body. GitHub wraps base64 at 60 columns.
fn decode_content(content: &str, encoding: &str, path: &str) -> Result<Vec<u8>> {
    match encoding {
        "base64" => {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD
                .decode(compact)
                .map_err(|e| Error::Transient(format!("failed to decode {path}: {e}")))
        }
        "utf-8" | "utf8" | "" => Ok(content.as_bytes().to_vec()),
        other => Err(Error::Transient(format!(
            "unsupported encoding '{other}' for {path}"
        ))),
    }
}

/// Blocking GitHub API client. An empty token means anonymous access.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    max_files: usize,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .field("max_files", &self.max_files)
            .finish()
    }
}

impl GitHubClient {
    pub fn new(settings: &GitHubSettings) -> Result<Self> {
        let base_url = Url::parse(&settings.api_url)
            .map_err(|e| Error::Settings(format!("invalid API URL '{}': {e}", settings.api_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Settings(format!(
                "invalid API URL '{}'",
                settings.api_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Settings(format!("failed to create HTTP client: {e}")))?;

        let token = Some(settings.token.trim().to_string()).filter(|t| !t.is_empty());

        Ok(Self {
            client,
            base_url,
            token,
            max_files: settings.max_files,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn repo_endpoint(&self, id: &PackageId, rest: &[&str]) -> Url {
        let mut segments = vec!["repos", id.owner(), id.name()];
        segments.extend_from_slice(rest);
        self.endpoint(segments)
    }

    fn contents_endpoint(&self, id: &PackageId, path: &str) -> Url {
        let mut segments = vec!["contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        self.repo_endpoint(id, &segments)
    }

    fn send(&self, url: Url, query: &[(&str, &str)], what: &str) -> Result<Response> {
        tracing::debug!("GET {}", url);
        let mut request = self
            .client
            .get(url)
            .query(query)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| Error::Transient(format!("{what}: {e}")))?;
        if !response.status().is_success() {
            return Err(status_error(response.status(), what));
        }
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<T> {
        self.send(url, query, what)?
            .json()
            .map_err(|e| Error::Transient(format!("invalid response for {what}: {e}")))
    }

    /// Like `get_json`, but a 404 means "does not exist".
    fn get_optional<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<Option<T>> {
        not_found_as_none(self.get_json(url, query, what))
    }
}

impl RemoteRepository for GitHubClient {
    fn get_repository(&self, id: &PackageId) -> Result<RepositoryInfo> {
        let what = format!("repository {id}");
        let repo: RepoResponse = self.get_json(self.repo_endpoint(id, &[]), &[], &what)?;
        Ok(repo.into())
    }

    fn latest_release(&self, id: &PackageId) -> Result<Option<String>> {
        let what = format!("latest release of {id}");
        let url = self.repo_endpoint(id, &["releases", "latest"]);
        let release: Option<ReleaseResponse> = self.get_optional(url, &[], &what)?;
        Ok(release_tag(release))
    }

    fn latest_tag(&self, id: &PackageId) -> Result<Option<String>> {
        let what = format!("tags of {id}");
        let url = self.repo_endpoint(id, &["tags"]);
        let tags: Vec<TagResponse> = self.get_json(url, &[("per_page", "1")], &what)?;
        Ok(first_tag(tags))
    }

    fn list_directory(
        &self,
        id: &PackageId,
        dir: &str,
        reference: &str,
    ) -> Result<Vec<TreeEntry>> {
        let what = format!("path '{dir}' in {id}");
        let url = self.contents_endpoint(id, dir);
        let entries: Vec<ContentEntry> = self.get_json(url, &[("ref", reference)], &what)?;

        Ok(entries.into_iter().map(TreeEntry::from).collect())
    }

    fn fetch_file(&self, id: &PackageId, path: &str, reference: &str) -> Result<Vec<u8>> {
        let what = format!("file {path} in {id}");
        let url = self.contents_endpoint(id, path);
        let file: FileResponse = self.get_json(url, &[("ref", reference)], &what)?;

        let encoding = file.encoding.as_deref().unwrap_or_default();
        match (file.content.as_deref(), encoding) {
            // Files over 1 MB come back with no inline content.
            (None, _) | (Some(""), "none") => {
                let raw = file.download_url.ok_or_else(|| {
                    Error::Transient(format!("no content returned for {what}"))
                })?;
                let raw = Url::parse(&raw)
                    .map_err(|e| Error::Transient(format!("bad download URL for {what}: {e}")))?;
                let bytes = self
                    .send(raw, &[], &what)?
                    .bytes()
                    .map_err(|e| Error::Transient(format!("{what}: {e}")))?;
                Ok(bytes.to_vec())
            }
            (Some(content), encoding) => decode_content(content, encoding, path),
        }
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<RepositoryInfo>> {
        let q = format!("topic:{PACKAGE_TOPIC} {}", query.trim());
        let per_page = limit.clamp(1, 100).to_string();
        let url = self.endpoint(["search", "repositories"]);
        tracing::debug!("searching '{q}'");
        let result: SearchResponse = self.get_json(
            url,
            &[
                ("q", q.as_str()),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
            ],
            "repository search",
        )?;

        let mut repos: Vec<RepositoryInfo> = result.items.into_iter().map(Into::into).collect();
        repos.truncate(limit);
        Ok(repos)
    }

    fn max_files(&self) -> usize {
        self.max_files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_url: &str) -> GitHubSettings {
        GitHubSettings {
            api_url: api_url.to_string(),
            ..GitHubSettings::default()
        }
    }

    #[test]
    fn test_status_classes() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "x"),
            Error::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "x"),
            Error::RateLimited(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "x"),
            Error::RateLimited(_)
        ));
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, "x"),
            Error::Transient(_)
        ));
    }

    #[test]
    fn test_decode_wrapped_base64() {
        // "# Hello\n" split across lines the way the contents API does
        let decoded = decode_content("IyBIZWxs\nbwo=\n", "base64", "a.md").unwrap();
        assert_eq!(decoded, b"# Hello\n");

        assert!(decode_content("!!!", "base64", "a.md").is_err());
        assert!(decode_content("x", "gzip", "a.md").is_err());
    }

    #[test]
    fn test_format_date() {
        assert_eq!(
            format_date("2024-03-09T17:45:00Z").as_deref(),
            Some("2024-03-09")
        );
        assert_eq!(format_date("yesterday"), None);
    }

    #[test]
    fn test_repo_response_conversion() {
        let body = r#"{
            "owner": {"login": "octo"},
            "name": "prompts",
            "description": null,
            "stargazers_count": 42,
            "updated_at": "2025-01-02T03:04:05Z",
            "default_branch": "develop"
        }"#;
        let repo: RepoResponse = serde_json::from_str(body).unwrap();
        let info = RepositoryInfo::from(repo);
        assert_eq!(info.key(), "octo/prompts");
        assert_eq!(info.description, "");
        assert_eq!(info.stars, 42);
        assert_eq!(info.updated_at.as_deref(), Some("2025-01-02"));
        assert_eq!(info.default_branch, "develop");
    }

    #[test]
    fn test_not_found_means_absent() {
        assert_eq!(not_found_as_none(Ok(1)).unwrap(), Some(1));
        assert_eq!(
            not_found_as_none::<u8>(Err(status_error(StatusCode::NOT_FOUND, "x"))).unwrap(),
            None
        );
        assert!(matches!(
            not_found_as_none::<u8>(Err(status_error(StatusCode::FORBIDDEN, "x"))),
            Err(Error::RateLimited(_))
        ));
        assert!(matches!(
            not_found_as_none::<u8>(Err(status_error(StatusCode::BAD_GATEWAY, "x"))),
            Err(Error::Transient(_))
        ));
    }

    #[test]
    fn test_release_and_tag_parsing() {
        let release: ReleaseResponse = serde_json::from_str(r#"{"tag_name": "v2.0.0"}"#).unwrap();
        assert_eq!(release_tag(Some(release)).as_deref(), Some("v2.0.0"));
        let blank: ReleaseResponse = serde_json::from_str(r#"{"tag_name": ""}"#).unwrap();
        assert_eq!(release_tag(Some(blank)), None);
        assert_eq!(release_tag(None), None);

        let tags: Vec<TagResponse> = serde_json::from_str("[]").unwrap();
        assert_eq!(first_tag(tags), None);
        let tags: Vec<TagResponse> =
            serde_json::from_str(r#"[{"name": "v1.1"}, {"name": "v1.0"}]"#).unwrap();
        assert_eq!(first_tag(tags).as_deref(), Some("v1.1"));
    }

    #[test]
    fn test_content_entry_kinds() {
        let body = r#"[
            {"type": "file", "path": "README.md"},
            {"type": "dir", "path": "docs"},
            {"type": "symlink", "path": "link.md"},
            {"type": "submodule", "path": "vendor"}
        ]"#;
        let entries: Vec<ContentEntry> = serde_json::from_str(body).unwrap();
        let kinds: Vec<EntryKind> = entries
            .into_iter()
            .map(|e| TreeEntry::from(e).kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EntryKind::File,
                EntryKind::Dir,
                EntryKind::Other,
                EntryKind::Other
            ]
        );
    }

    #[test]
    fn test_endpoints() {
        let client = GitHubClient::new(&settings("https://api.github.com")).unwrap();
        let id = PackageId::parse("octo/prompts").unwrap();

        assert_eq!(
            client.repo_endpoint(&id, &["releases", "latest"]).as_str(),
            "https://api.github.com/repos/octo/prompts/releases/latest"
        );
        assert_eq!(
            client.contents_endpoint(&id, "").as_str(),
            "https://api.github.com/repos/octo/prompts/contents"
        );
        assert_eq!(
            client.contents_endpoint(&id, "docs/my notes.md").as_str(),
            "https://api.github.com/repos/octo/prompts/contents/docs/my%20notes.md"
        );
    }

    #[test]
    fn test_enterprise_base_path_is_kept() {
        let client = GitHubClient::new(&settings("https://ghe.example.com/api/v3/")).unwrap();
        assert_eq!(
            client.endpoint(["search", "repositories"]).as_str(),
            "https://ghe.example.com/api/v3/search/repositories"
        );
    }

    #[test]
    fn test_token_handling() {
        let anonymous = GitHubClient::new(&settings("https://api.github.com")).unwrap();
        assert!(!anonymous.is_authenticated());

        let authed = GitHubClient::new(&GitHubSettings {
            token: " ghp_secret ".to_string(),
            ..GitHubSettings::default()
        })
        .unwrap();
        assert!(authed.is_authenticated());
        assert!(!format!("{:?}", authed).contains("ghp_secret"));
    }

    #[test]
    fn test_invalid_api_url() {
        assert!(matches!(
            GitHubClient::new(&settings("not a url")),
            Err(Error::Settings(_))
        ));
    }
}
