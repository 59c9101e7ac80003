//! Importance Ranking
//!
//! Heuristic ranking of files by documentation value. The scorer is not a
//! guarantee of relevance - the contract is determinism: an identical tree
//! with identical ignore/allow lists always produces the same ranking.

use crate::constants::{ranking, scan};
use crate::types::{FileNode, RankedFile};

/// Ranks files inside a scanned forest, bounded to the top K.
#[derive(Debug, Clone)]
pub struct ImportanceScorer {
    limit: usize,
    allowed_extensions: Vec<String>,
    ignored_dirs: Vec<String>,
}

impl Default for ImportanceScorer {
    fn default() -> Self {
        Self {
            limit: ranking::DEFAULT_LIMIT,
            allowed_extensions: ranking::ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            ignored_dirs: scan::IGNORED_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl ImportanceScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Rank all allowed files in the forest, descending by score.
    ///
    /// Ties keep first-seen (depth-first traversal) order. Files whose
    /// extension is outside the allow-list are excluded entirely, not merely
    /// ranked low.
    pub fn rank(&self, forest: &[FileNode]) -> Vec<RankedFile> {
        let mut files = Vec::new();
        self.traverse(forest, &mut files);

        files.sort_by(|a, b| b.score.cmp(&a.score));
        files.truncate(self.limit);
        files
    }

    fn traverse(&self, nodes: &[FileNode], out: &mut Vec<RankedFile>) {
        for node in nodes {
            if node.is_directory() {
                if !self.is_ignored_dir(&node.path) {
                    self.traverse(node.children.as_deref().unwrap_or_default(), out);
                }
            } else if self.is_allowed(&node.name) {
                out.push(RankedFile {
                    path: node.path.clone(),
                    score: score_name(&node.name),
                });
            }
        }
    }

    fn is_ignored_dir(&self, path: &str) -> bool {
        self.ignored_dirs.iter().any(|dir| {
            path.split('/').any(|segment| segment == dir)
        })
    }

    fn is_allowed(&self, name: &str) -> bool {
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                let ext = ext.to_ascii_lowercase();
                self.allowed_extensions.iter().any(|a| *a == ext)
            }
            _ => false,
        }
    }
}

/// Additive filename heuristics correlated with documentation value.
fn score_name(name: &str) -> u32 {
    let lower = name.to_lowercase();
    let mut score = 0;

    if lower.contains("route") || lower.contains("api") {
        score += ranking::ROUTE_BONUS;
    }
    if lower.contains("page") || lower.contains("view") {
        score += ranking::PAGE_BONUS;
    }
    if lower.contains("model") || lower.contains("schema") || lower.contains("types") {
        score += ranking::MODEL_BONUS;
    }
    if lower.contains("service") || lower.contains("lib") || lower.contains("utils") {
        score += ranking::SERVICE_BONUS;
    }
    if lower.contains("index") || lower.contains("main") || lower.contains("app") {
        score += ranking::ENTRY_BONUS;
    }
    if name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        score += ranking::COMPONENT_BONUS;
    }

    score
}
