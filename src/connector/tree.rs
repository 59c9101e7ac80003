//! Flat Listing Reconstruction
//!
//! Both connectors enumerate their source as a flat list of `(path, kind)`
//! entries - the remote tree API returns one, and the filesystem walker is
//! flattened to match - and this module rebuilds the hierarchy.
//!
//! Invariants:
//! - every listed entry is reachable exactly once from the returned forest
//! - reconstruction does not depend on listing order ("parent first" is not
//!   assumed); an entry whose parent path has no node attaches at the root
//!   instead of being dropped
//! - children preserve source listing order

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::types::{FileNode, NodeKind, basename};

/// One entry of a flat recursive listing
#[derive(Debug, Clone)]
pub struct FlatEntry {
    pub path: String,
    pub kind: NodeKind,
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl FlatEntry {
    pub fn new(path: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            size: None,
            last_modified: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_last_modified(mut self, ts: DateTime<Utc>) -> Self {
        self.last_modified = Some(ts);
        self
    }
}

/// Rebuild a forest of `FileNode`s from a flat recursive listing.
///
/// Two passes: create one node per entry, then link each node to its parent.
/// Linking never assumes parents appear before children, and a missing
/// parent fails open by attaching the node at the root.
pub fn build_forest(entries: Vec<FlatEntry>) -> Vec<FileNode> {
    let mut nodes: Vec<Option<FileNode>> = Vec::with_capacity(entries.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        let node = FileNode {
            name: basename(&entry.path),
            path: entry.path.clone(),
            kind: entry.kind,
            size: entry.size,
            last_modified: entry.last_modified,
            children: match entry.kind {
                NodeKind::Directory => Some(Vec::new()),
                NodeKind::File => None,
            },
            content: None,
        };
        // First entry wins on duplicate paths; the duplicate still gets a node
        // but is unreachable as a parent.
        index.entry(entry.path.clone()).or_insert(i);
        nodes.push(Some(node));
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
    let mut roots: Vec<usize> = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        match parent_path(&entry.path) {
            Some(parent) => match index.get(parent) {
                Some(&p) if p != i && entries[p].kind == NodeKind::Directory => {
                    children[p].push(i);
                }
                // Parent missing from the listing, or listed as a file:
                // attach at the root so the entry stays reachable.
                _ => roots.push(i),
            },
            None => roots.push(i),
        }
    }

    roots
        .into_iter()
        .filter_map(|i| assemble(i, &mut nodes, &children))
        .collect()
}

fn parent_path(path: &str) -> Option<&str> {
    path.rfind('/').map(|idx| &path[..idx])
}

fn assemble(
    i: usize,
    nodes: &mut Vec<Option<FileNode>>,
    children: &[Vec<usize>],
) -> Option<FileNode> {
    let mut node = nodes[i].take()?;
    if node.is_directory() {
        node.children = Some(
            children[i]
                .iter()
                .filter_map(|&c| assemble(c, nodes, children))
                .collect(),
        );
    }
    Some(node)
}

/// Render a forest as the flat `[DIR]`/`[FILE]` listing used for prompting.
pub fn render_tree_text(forest: &[FileNode]) -> String {
    let mut lines = Vec::new();
    let mut stack: Vec<&FileNode> = forest.iter().rev().collect();

    while let Some(node) = stack.pop() {
        let tag = if node.is_directory() { "[DIR]" } else { "[FILE]" };
        lines.push(format!("{} {}", tag, node.path));
        if let Some(children) = &node.children {
            for child in children.iter().rev() {
                stack.push(child);
            }
        }
    }

    lines.join("\n")
}
