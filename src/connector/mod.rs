//! Source Connectors
//!
//! Adapters normalizing heterogeneous content sources (local filesystem,
//! GitHub) to one capability contract: `connect` / `scan` /
//! `get_file_content`. Adding a source means adding a variant struct, not
//! touching callers.
//!
//! ## Modules
//!
//! - `tree`: flat-listing -> forest reconstruction and prompt rendering
//! - `detect`: pure manifest classification (framework, package manager)
//! - `filesystem`: local directory adapter
//! - `github`: hosted repository adapter over the REST API

pub mod detect;
pub mod filesystem;
pub mod github;
pub mod tree;

pub use filesystem::FilesystemConnector;
pub use github::GitHubConnector;
pub use tree::{FlatEntry, build_forest, render_tree_text};

use std::sync::Arc;

use async_trait::async_trait;

use crate::ranking::ImportanceScorer;
use crate::types::{FileNode, ProjectMetadata, RankedFile, RepoId, Result};

/// Where a connector's bytes come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Filesystem,
    GitHub,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filesystem => write!(f, "filesystem"),
            Self::GitHub => write!(f, "github"),
        }
    }
}

/// Shared connector handle for pipeline stages.
pub type SharedConnector = Arc<dyn Connector>;

/// Capability contract implemented identically by every source adapter.
///
/// `connect()` must succeed before `scan()` or `get_file_content()`;
/// implementations hold their session state behind interior mutability so a
/// connector can be shared across pipeline stages.
#[async_trait]
pub trait Connector: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Best-effort repository identity derivable without touching the
    /// source (parsed from the URL or path). Lets the plan phase consult
    /// the persistent store before spending any network calls.
    fn identity_hint(&self) -> Option<RepoId>;

    /// Validate the source is reachable and derive project metadata.
    ///
    /// Clears every per-instance cache, so a reconnect observes a fresh
    /// view of the source.
    async fn connect(&self) -> Result<ProjectMetadata>;

    /// Recursively enumerate the source, excluding deny-listed directories.
    ///
    /// Never reads file content. Repeated calls against an unchanged source
    /// return an equivalent tree.
    async fn scan(&self) -> Result<Vec<FileNode>>;

    /// Fetch one file's text on demand, decoding transport encodings.
    async fn get_file_content(&self, path: &str) -> Result<String>;

    /// Scan result memoized per connector instance.
    ///
    /// Invalidated by `connect()`; never process-global state.
    async fn cached_tree(&self) -> Result<Arc<Vec<FileNode>>>;

    /// Flattened `[DIR]`/`[FILE]` rendering of the tree for prompting.
    async fn tree_text(&self) -> Result<String> {
        let tree = self.cached_tree().await?;
        Ok(render_tree_text(&tree))
    }

    /// Top files by documentation value, bounded to `limit`.
    async fn important_files(&self, limit: usize) -> Result<Vec<RankedFile>> {
        let tree = self.cached_tree().await?;
        Ok(ImportanceScorer::with_limit(limit).rank(&tree))
    }
}
