//! Source-side type definitions
//!
//! Shared, source-agnostic representations of a connected project and its
//! file tree. Every connector emits these regardless of where the bytes
//! actually live.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Project Metadata
// =============================================================================

/// Package manager detected from lockfiles in the project root
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Npm => write!(f, "npm"),
            Self::Pnpm => write!(f, "pnpm"),
            Self::Yarn => write!(f, "yarn"),
            Self::Bun => write!(f, "bun"),
        }
    }
}

/// Identity and shape of a connected project.
///
/// Created once per successful `connect()`; immutable for the lifetime of
/// the connector session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Opaque identifier (owner/repo for remote sources, path digest for local)
    pub id: String,
    /// Human-readable project name
    pub name: String,
    /// Best-effort framework classification from the manifest
    pub framework: Option<String>,
    /// Detected package manager, if any lockfile is present
    pub package_manager: Option<PackageManager>,
    /// Conventional entry point files found in the manifest
    pub entry_points: Vec<String>,
    /// Environment files found at the project root
    pub env_files: Vec<String>,
    /// README text, if one was readable at connect time
    pub readme: Option<String>,
    /// Connection timestamp
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// File Tree
// =============================================================================

/// Whether a tree entry is a file or a directory
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// A single filesystem entry, source-agnostic.
///
/// `path` is the canonical source-relative identifier and the join key
/// across the scorer, assembler, and content-fetch stages. Children are
/// present only for directories and preserve source listing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileNode {
    pub path: String,
    pub name: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
    /// Populated lazily via `get_file_content`, never during `scan()`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FileNode {
    /// Create a file node from a path, deriving the basename
    pub fn file(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: basename(&path),
            path,
            kind: NodeKind::File,
            size: None,
            last_modified: None,
            children: None,
            content: None,
        }
    }

    /// Create a directory node with an empty child list
    pub fn directory(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: basename(&path),
            path,
            kind: NodeKind::Directory,
            size: None,
            last_modified: None,
            children: Some(Vec::new()),
            content: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// Last path segment of a `/`-separated source path
pub fn basename(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

// =============================================================================
// Ranking
// =============================================================================

/// A file path paired with its heuristic documentation-value score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedFile {
    pub path: String,
    pub score: u32,
}
