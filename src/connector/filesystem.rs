//! Filesystem Connector
//!
//! Scans a local directory tree. The walk itself runs on a blocking thread
//! (the `ignore` walker respects gitignore files and skips the shared
//! deny-list), is flattened to relative paths, and goes through the same
//! forest reconstruction the remote connector uses.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

use super::tree::{FlatEntry, build_forest};
use super::{Connector, SourceKind, detect};
use crate::constants::scan;
use crate::types::{
    DocloomError, FileNode, NodeKind, ProjectMetadata, RepoId, Result,
};

pub struct FilesystemConnector {
    root: PathBuf,
    name_override: Option<String>,
    exclude: Vec<String>,
    metadata: RwLock<Option<ProjectMetadata>>,
    tree_cache: RwLock<Option<Arc<Vec<FileNode>>>>,
}

impl FilesystemConnector {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            name_override: None,
            exclude: Vec::new(),
            metadata: RwLock::new(None),
            tree_cache: RwLock::new(None),
        }
    }

    /// Override the project name derived from the directory basename
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name_override = Some(name.into());
        self
    }

    /// Additional glob patterns excluded from scans
    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    fn project_name(&self) -> String {
        self.name_override.clone().unwrap_or_else(|| {
            self.root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "project".to_string())
        })
    }

    async fn ensure_connected(&self, operation: &'static str) -> Result<()> {
        if self.metadata.read().await.is_none() {
            return Err(DocloomError::not_connected(operation));
        }
        Ok(())
    }

    /// Resolve a source-relative path inside the root, rejecting escapes.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(DocloomError::not_found(path));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl Connector for FilesystemConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Filesystem
    }

    fn identity_hint(&self) -> Option<RepoId> {
        Some(RepoId::new(self.project_name()))
    }

    async fn connect(&self) -> Result<ProjectMetadata> {
        let stat = tokio::fs::metadata(&self.root).await.map_err(|e| {
            DocloomError::unreachable(self.root.display().to_string(), e.to_string())
        })?;
        if !stat.is_dir() {
            return Err(DocloomError::unreachable(
                self.root.display().to_string(),
                "not a directory",
            ));
        }

        let mut root_files = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            root_files.push(entry.file_name().to_string_lossy().to_string());
        }

        let mut framework = None;
        let mut entry_points = Vec::new();
        if let Ok(raw) = tokio::fs::read_to_string(self.root.join("package.json")).await {
            if let Ok(manifest) = serde_json::from_str::<serde_json::Value>(&raw) {
                framework = detect::detect_framework(&manifest);
                entry_points = detect::manifest_entry_points(&manifest);
            }
        }

        let env_files = root_files
            .iter()
            .filter(|name| detect::is_env_file(name))
            .cloned()
            .collect();

        let readme = tokio::fs::read_to_string(self.root.join("README.md"))
            .await
            .ok();

        let mut id = format!(
            "{:x}",
            Sha256::digest(self.root.to_string_lossy().as_bytes())
        );
        id.truncate(16);

        let metadata = ProjectMetadata {
            id,
            name: self.project_name(),
            framework,
            package_manager: detect::detect_package_manager(&root_files),
            entry_points,
            env_files,
            readme,
            created_at: Utc::now(),
        };

        debug!(
            root = %self.root.display(),
            framework = ?metadata.framework,
            "Filesystem source connected"
        );

        // Reconnecting observes a fresh view of the source
        *self.tree_cache.write().await = None;
        *self.metadata.write().await = Some(metadata.clone());

        Ok(metadata)
    }

    async fn scan(&self) -> Result<Vec<FileNode>> {
        self.ensure_connected("scan").await?;

        let root = self.root.clone();
        let exclude = self.exclude.clone();
        let entries = tokio::task::spawn_blocking(move || walk_flat(&root, &exclude))
            .await
            .map_err(|e| DocloomError::Storage(format!("Scan task failed: {}", e)))??;

        debug!(entries = entries.len(), "Filesystem scan complete");
        Ok(build_forest(entries))
    }

    async fn get_file_content(&self, path: &str) -> Result<String> {
        self.ensure_connected("get_file_content").await?;

        let full = self.resolve(path)?;
        let stat = match tokio::fs::metadata(&full).await {
            Ok(stat) => stat,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DocloomError::not_found(path));
            }
            Err(e) => return Err(e.into()),
        };
        if stat.is_dir() {
            return Err(DocloomError::not_a_file(path));
        }
        if stat.len() > scan::MAX_FILE_SIZE {
            return Err(DocloomError::Storage(format!(
                "{} exceeds the {} byte fetch ceiling",
                path,
                scan::MAX_FILE_SIZE
            )));
        }

        let bytes = tokio::fs::read(&full).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
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

/// Walk the root into a flat listing of source-relative entries.
fn walk_flat(root: &Path, exclude: &[String]) -> Result<Vec<FlatEntry>> {
    let patterns: Vec<glob::Pattern> = exclude
        .iter()
        .filter_map(|p| glob::Pattern::new(p).ok())
        .collect();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .follow_links(false)
        .filter_entry(|entry| {
            // Depth 0 is the scan root itself, whatever it happens to be named
            entry.depth() == 0
                || entry
                    .file_name()
                    .to_str()
                    .map(|name| !scan::IGNORED_DIRS.contains(&name))
                    .unwrap_or(true)
        })
        .build();

    let mut entries = Vec::new();
    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path == root {
            continue;
        }

        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");

        if patterns.iter().any(|p| p.matches(&relative)) {
            continue;
        }

        let Ok(stat) = path.metadata() else { continue };
        let kind = if stat.is_dir() {
            NodeKind::Directory
        } else {
            NodeKind::File
        };

        let mut flat = FlatEntry::new(relative, kind);
        if kind == NodeKind::File {
            flat = flat.with_size(stat.len());
            if let Ok(modified) = stat.modified() {
                flat = flat.with_last_modified(DateTime::<Utc>::from(modified));
            }
        }
        entries.push(flat);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src/index.ts"), "export const x = 1;\n").unwrap();
        fs::write(root.join("README.md"), "# Fixture\n").unwrap();
        fs::write(
            root.join("package.json"),
            r#"{"dependencies": {"next": "14.0.0"}, "main": "src/index.ts"}"#,
        )
        .unwrap();
        fs::write(root.join("pnpm-lock.yaml"), "lockfileVersion: 9\n").unwrap();
        fs::write(root.join(".env.local"), "SECRET=1\n").unwrap();
        fs::create_dir(root.join("node_modules")).unwrap();
        fs::write(root.join("node_modules/dep.js"), "junk").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_connect_infers_metadata() {
        let dir = fixture();
        let connector = FilesystemConnector::new(dir.path());
        let metadata = connector.connect().await.unwrap();

        assert_eq!(metadata.framework.as_deref(), Some("Next.js"));
        assert_eq!(
            metadata.package_manager,
            Some(crate::types::PackageManager::Pnpm)
        );
        assert_eq!(metadata.entry_points, vec!["src/index.ts"]);
        assert_eq!(metadata.env_files, vec![".env.local"]);
        assert!(metadata.readme.as_deref().unwrap_or("").contains("Fixture"));
        assert_eq!(metadata.id.len(), 16);
    }

    #[tokio::test]
    async fn test_connect_rejects_missing_root() {
        let connector = FilesystemConnector::new("/definitely/not/here");
        let err = connector.connect().await.unwrap_err();
        assert!(matches!(err, DocloomError::SourceUnreachable { .. }));
    }

    #[tokio::test]
    async fn test_connect_rejects_file_root() {
        let dir = fixture();
        let connector = FilesystemConnector::new(dir.path().join("README.md"));
        let err = connector.connect().await.unwrap_err();
        assert!(matches!(err, DocloomError::SourceUnreachable { .. }));
    }

    #[tokio::test]
    async fn test_scan_requires_connect() {
        let dir = fixture();
        let connector = FilesystemConnector::new(dir.path());
        let err = connector.scan().await.unwrap_err();
        assert!(matches!(err, DocloomError::NotConnected { .. }));
    }

    #[tokio::test]
    async fn test_scan_excludes_deny_list() {
        let dir = fixture();
        let connector = FilesystemConnector::new(dir.path());
        connector.connect().await.unwrap();

        let forest = connector.scan().await.unwrap();
        let text = super::super::render_tree_text(&forest);
        assert!(text.contains("[FILE] src/index.ts"));
        assert!(text.contains("[DIR] src"));
        assert!(!text.contains("node_modules"));
    }

    #[tokio::test]
    async fn test_get_file_content() {
        let dir = fixture();
        let connector = FilesystemConnector::new(dir.path());
        connector.connect().await.unwrap();

        let content = connector.get_file_content("src/index.ts").await.unwrap();
        assert!(content.contains("export const x"));

        let err = connector.get_file_content("src").await.unwrap_err();
        assert!(matches!(err, DocloomError::NotAFile { .. }));

        let err = connector.get_file_content("missing.ts").await.unwrap_err();
        assert!(matches!(err, DocloomError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_oversized_file_refused() {
        let dir = fixture();
        let big = "x".repeat((scan::MAX_FILE_SIZE + 1) as usize);
        fs::write(dir.path().join("huge.ts"), big).unwrap();

        let connector = FilesystemConnector::new(dir.path());
        connector.connect().await.unwrap();

        let err = connector.get_file_content("huge.ts").await.unwrap_err();
        assert!(matches!(err, DocloomError::Storage(_)));
    }

    #[tokio::test]
    async fn test_path_escape_rejected() {
        let dir = fixture();
        let connector = FilesystemConnector::new(dir.path());
        connector.connect().await.unwrap();

        let err = connector
            .get_file_content("../outside.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, DocloomError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cached_tree_survives_until_reconnect() {
        let dir = fixture();
        let connector = FilesystemConnector::new(dir.path());
        connector.connect().await.unwrap();

        let first = connector.cached_tree().await.unwrap();
        let second = connector.cached_tree().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        connector.connect().await.unwrap();
        let third = connector.cached_tree().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[tokio::test]
    async fn test_important_files_through_trait() {
        let dir = fixture();
        let connector = FilesystemConnector::new(dir.path());
        connector.connect().await.unwrap();

        let ranked = connector.important_files(10).await.unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].path, "src/index.ts");
    }
}
