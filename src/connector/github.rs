//! GitHub Connector
//!
//! Talks to the GitHub REST API: one repository lookup resolves identity and
//! default branch, one recursive `git/trees` call lists the whole repository
//! (bounded API budget - no per-directory recursion), and blob content is
//! fetched on demand through the contents API with transparent base64
//! decoding.
//!
//! Session state (default branch, memoized tree, blob cache) lives on the
//! connector instance and is reset by `connect()`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use dashmap::DashMap;
use regex::Regex;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use super::tree::{FlatEntry, build_forest};
use super::{Connector, SourceKind, detect};
use crate::constants::network;
use crate::types::{
    DocloomError, FileNode, NodeKind, ProjectMetadata, RepoId, Result,
};

const DEFAULT_API_BASE: &str = "https://api.github.com";

pub struct GitHubConnector {
    owner: String,
    repo: String,
    api_base: String,
    token: Option<SecretString>,
    client: reqwest::Client,
    branch: RwLock<Option<String>>,
    tree_cache: RwLock<Option<Arc<Vec<FileNode>>>>,
    content_cache: DashMap<String, String>,
}

impl std::fmt::Debug for GitHubConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConnector")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl GitHubConnector {
    /// Create a connector from a human-supplied repository URL or an
    /// `owner/repo` shorthand. Without a token only public repositories
    /// are reachable.
    pub fn from_url(repo_url: &str, token: Option<String>) -> Result<Self> {
        let (owner, repo) = parse_repo_url(repo_url).ok_or_else(|| {
            DocloomError::unreachable(repo_url, "not a recognizable GitHub repository URL")
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network::DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(network::CONNECTION_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            owner,
            repo,
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.map(SecretString::from),
            client,
            branch: RwLock::new(None),
            tree_cache: RwLock::new(None),
            content_cache: DashMap::new(),
        })
    }

    /// Point the connector at a different API host (enterprise installs)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn repo_id(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    async fn current_branch(&self, operation: &'static str) -> Result<String> {
        self.branch
            .read()
            .await
            .clone()
            .ok_or(DocloomError::not_connected(operation))
    }

    /// GET an API path with auth, retrying transient failures with backoff.
    async fn api_get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.api_base, path);

        let send = || async {
            let mut request = self
                .client
                .get(&url)
                .header(reqwest::header::USER_AGENT, network::USER_AGENT)
                .header(reqwest::header::ACCEPT, "application/vnd.github+json");
            if let Some(token) = &self.token {
                request = request.bearer_auth(token.expose_secret());
            }

            let response = request.send().await?;

            // Promote retryable statuses to errors so the backoff sees them;
            // other statuses are mapped by the caller.
            let status = response.status();
            if (status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS)
                && let Err(e) = response.error_for_status_ref()
            {
                return Err(DocloomError::Http(e));
            }

            Ok(response)
        };

        send.retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(network::BASE_DELAY_MS))
                .with_max_delay(Duration::from_secs(network::MAX_DELAY_SECS))
                .with_max_times(network::MAX_TRANSIENT_RETRIES),
        )
        .when(DocloomError::is_transient)
        .notify(|err, dur| {
            warn!(error = %err, wait_ms = dur.as_millis(), "GitHub request retrying");
        })
        .await
    }
}

#[async_trait]
impl Connector for GitHubConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::GitHub
    }

    fn identity_hint(&self) -> Option<RepoId> {
        Some(RepoId::new(self.repo_id()))
    }

    async fn connect(&self) -> Result<ProjectMetadata> {
        let response = self
            .api_get(&format!("repos/{}/{}", self.owner, self.repo))
            .await?;

        if !response.status().is_success() {
            return Err(DocloomError::unreachable(
                self.repo_id(),
                format!("repository lookup failed ({})", response.status()),
            ));
        }

        let info: RepoInfo = response.json().await?;

        // A reconnect observes a fresh view of the repository
        *self.branch.write().await = Some(info.default_branch.clone());
        *self.tree_cache.write().await = None;
        self.content_cache.clear();

        // Shallow root listing backs lockfile and env-file detection
        let mut root_files: Vec<String> = Vec::new();
        let listing = self
            .api_get(&format!("repos/{}/{}/contents/", self.owner, self.repo))
            .await?;
        if listing.status().is_success() {
            if let Ok(entries) = listing.json::<Vec<RootEntry>>().await {
                root_files = entries.into_iter().map(|e| e.name).collect();
            }
        }

        let mut framework = None;
        let mut entry_points = Vec::new();
        if root_files.iter().any(|f| f == "package.json") {
            if let Ok(raw) = self.get_file_content("package.json").await {
                if let Ok(manifest) = serde_json::from_str::<serde_json::Value>(&raw) {
                    framework = detect::detect_framework(&manifest);
                    entry_points = detect::manifest_entry_points(&manifest);
                }
            }
        }

        let readme = if root_files.iter().any(|f| f == "README.md") {
            self.get_file_content("README.md").await.ok()
        } else {
            None
        };

        let env_files = root_files
            .iter()
            .filter(|name| detect::is_env_file(name))
            .cloned()
            .collect();

        debug!(
            repo = %self.repo_id(),
            branch = %info.default_branch,
            framework = ?framework,
            "GitHub source connected"
        );

        Ok(ProjectMetadata {
            id: self.repo_id(),
            name: self.repo.clone(),
            framework,
            package_manager: detect::detect_package_manager(&root_files),
            entry_points,
            env_files,
            readme,
            created_at: chrono::Utc::now(),
        })
    }

    async fn scan(&self) -> Result<Vec<FileNode>> {
        let branch = self.current_branch("scan").await?;

        let response = self
            .api_get(&format!(
                "repos/{}/{}/git/refs/heads/{}",
                self.owner, self.repo, branch
            ))
            .await?;
        if !response.status().is_success() {
            return Err(DocloomError::unreachable(
                self.repo_id(),
                format!("branch {} lookup failed ({})", branch, response.status()),
            ));
        }
        let head: GitRef = response.json().await?;

        // One recursive listing for the entire tree
        let response = self
            .api_get(&format!(
                "repos/{}/{}/git/trees/{}?recursive=true",
                self.owner, self.repo, head.object.sha
            ))
            .await?;
        if !response.status().is_success() {
            return Err(DocloomError::unreachable(
                self.repo_id(),
                format!("tree listing failed ({})", response.status()),
            ));
        }
        let listing: GitTree = response.json().await?;

        if listing.truncated {
            warn!(
                repo = %self.repo_id(),
                "GitHub truncated the recursive tree listing; scan is partial"
            );
        }

        debug!(entries = listing.tree.len(), "GitHub scan complete");
        Ok(build_forest(flat_entries_from_tree(listing.tree)))
    }

    async fn get_file_content(&self, path: &str) -> Result<String> {
        let branch = self.current_branch("get_file_content").await?;

        if let Some(cached) = self.content_cache.get(path) {
            return Ok(cached.value().clone());
        }

        let response = self
            .api_get(&format!(
                "repos/{}/{}/contents/{}?ref={}",
                self.owner, self.repo, path, branch
            ))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DocloomError::not_found(path));
        }
        if !response.status().is_success() {
            return Err(DocloomError::unreachable(
                self.repo_id(),
                format!("content fetch for {} failed ({})", path, response.status()),
            ));
        }

        let body: serde_json::Value = response.json().await?;
        let content = decode_content(path, &body)?;
        self.content_cache.insert(path.to_string(), content.clone());
        Ok(content)
    }

    async fn cached_tree(&self) -> Result<Arc<Vec<FileNode>>> {
        if let Some(tree) = self.tree_cache.read().await.as_ref() {
            return Ok(Arc::clone(tree));
        }

        let tree = Arc::new(self.scan().await?);
        *self.tree_cache.write().await = Some(Arc::clone(&tree));
        Ok(tree)
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct RootEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitRefTarget,
}

#[derive(Debug, Deserialize)]
struct GitRefTarget {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitTree {
    tree: Vec<GitTreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct GitTreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    size: Option<u64>,
}

// =============================================================================
// Pure Helpers
// =============================================================================

/// Extract `(owner, repo)` from a repository URL or `owner/repo` shorthand.
fn parse_repo_url(repo_url: &str) -> Option<(String, String)> {
    // Full URLs go through a real parser; the host must be github.com
    if repo_url.contains("://") {
        let parsed = Url::parse(repo_url).ok()?;
        if parsed.host_str() != Some("github.com") {
            return None;
        }
        let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
        let owner = segments.next()?.to_string();
        let repo = segments.next()?.trim_end_matches(".git").to_string();
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        return Some((owner, repo));
    }

    // scp-style remotes (git@github.com:owner/repo.git)
    let scp_pattern = Regex::new(r"github\.com:([^/\s]+)/([^/\s]+)").ok()?;
    if let Some(captures) = scp_pattern.captures(repo_url) {
        let owner = captures[1].to_string();
        let repo = captures[2].trim_end_matches(".git").trim_end_matches('/');
        if !repo.is_empty() {
            return Some((owner, repo.to_string()));
        }
    }

    // owner/repo shorthand, rejecting anything that looks like a URL or path
    let trimmed = repo_url.trim().trim_end_matches('/');
    let mut parts = trimmed.split('/');
    if let (Some(owner), Some(repo), None) = (parts.next(), parts.next(), parts.next())
        && !owner.is_empty()
        && !repo.is_empty()
        && !trimmed.contains(':')
        && !owner.starts_with('.')
    {
        return Some((owner.to_string(), repo.trim_end_matches(".git").to_string()));
    }

    None
}

/// Map the recursive tree payload to flat entries.
///
/// `tree` entries become directories; everything else (blobs, submodule
/// commits) is treated as a file.
fn flat_entries_from_tree(entries: Vec<GitTreeEntry>) -> Vec<FlatEntry> {
    entries
        .into_iter()
        .map(|entry| {
            let kind = if entry.kind == "tree" {
                NodeKind::Directory
            } else {
                NodeKind::File
            };
            let mut flat = FlatEntry::new(entry.path, kind);
            if let Some(size) = entry.size {
                flat = flat.with_size(size);
            }
            flat
        })
        .collect()
}

/// Decode a contents-API payload into text.
fn decode_content(path: &str, body: &serde_json::Value) -> Result<String> {
    if body.is_array() {
        return Err(DocloomError::not_a_file(path));
    }
    if body.get("type").and_then(|t| t.as_str()) != Some("file") {
        return Err(DocloomError::not_a_file(path));
    }

    let raw = body
        .get("content")
        .and_then(|c| c.as_str())
        .unwrap_or_default();

    match body.get("encoding").and_then(|e| e.as_str()) {
        Some("base64") => {
            // The API wraps base64 at 60 columns; strip all whitespace first
            let compact: String = raw.split_whitespace().collect();
            let bytes = BASE64.decode(compact).map_err(|e| {
                DocloomError::Storage(format!("Invalid base64 content for {}: {}", path, e))
            })?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Ok(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_url_variants() {
        let cases = [
            "https://github.com/acme/widgets",
            "https://github.com/acme/widgets.git",
            "https://github.com/acme/widgets/",
            "git@github.com:acme/widgets.git",
            "acme/widgets",
        ];
        for case in cases {
            assert_eq!(
                parse_repo_url(case),
                Some(("acme".to_string(), "widgets".to_string())),
                "failed for {}",
                case
            );
        }
    }

    #[test]
    fn test_parse_repo_url_rejects_garbage() {
        assert_eq!(parse_repo_url("https://gitlab.com/acme/widgets"), None);
        assert_eq!(parse_repo_url("not a url"), None);
        assert_eq!(parse_repo_url("justaname"), None);
        assert_eq!(parse_repo_url(""), None);
    }

    #[test]
    fn test_flat_entries_map_tree_kinds() {
        let payload = serde_json::json!({
            "tree": [
                { "path": "src", "type": "tree" },
                { "path": "src/index.ts", "type": "blob", "size": 42 },
                { "path": "README.md", "type": "blob", "size": 10 }
            ],
            "truncated": false
        });
        let listing: GitTree = serde_json::from_value(payload).unwrap();
        let forest = build_forest(flat_entries_from_tree(listing.tree));

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].path, "src");
        assert!(forest[0].is_directory());
        let children = forest[0].children.as_ref().unwrap();
        assert_eq!(children[0].path, "src/index.ts");
        assert_eq!(children[0].size, Some(42));
        assert_eq!(forest[1].path, "README.md");
    }

    #[test]
    fn test_decode_base64_content() {
        let body = serde_json::json!({
            "type": "file",
            "encoding": "base64",
            "content": "aGVsbG8g\nd29ybGQ=\n"
        });
        assert_eq!(decode_content("hi.txt", &body).unwrap(), "hello world");
    }

    #[test]
    fn test_decode_rejects_directories() {
        let listing = serde_json::json!([{ "name": "src" }]);
        assert!(matches!(
            decode_content("src", &listing).unwrap_err(),
            DocloomError::NotAFile { .. }
        ));

        let symlink = serde_json::json!({ "type": "symlink", "target": "elsewhere" });
        assert!(matches!(
            decode_content("link", &symlink).unwrap_err(),
            DocloomError::NotAFile { .. }
        ));
    }

    #[tokio::test]
    async fn test_scan_requires_connect() {
        let connector = GitHubConnector::from_url("acme/widgets", None).unwrap();
        let err = connector.scan().await.unwrap_err();
        assert!(matches!(err, DocloomError::NotConnected { .. }));
    }

    #[test]
    fn test_identity_hint_before_any_network() {
        let connector =
            GitHubConnector::from_url("https://github.com/acme/widgets", None).unwrap();
        assert_eq!(
            connector.identity_hint().map(|r| r.into_inner()),
            Some("acme/widgets".to_string())
        );
    }
}
