//! Context Assembly
//!
//! Builds the bounded text blob that grounds every generation call. Content
//! is fetched through a connector for the top-ranked files, clamped per file
//! and in aggregate, and stitched together with path delimiters so the model
//! can attribute code to files.
//!
//! Fetch failures for individual files are caught here - never inside the
//! connectors - so one missing file cannot abort a whole documentation run.

use tracing::{debug, warn};

use crate::connector::Connector;
use crate::constants::context as limits;
use crate::types::{DocloomError, GenerationUnit, RankedFile, RepoId, Result};

/// Character ceilings applied during assembly
#[derive(Debug, Clone)]
pub struct ContextLimits {
    /// Ceiling for any individual file's content
    pub max_file_chars: usize,
    /// Ceiling for the README preamble
    pub max_readme_chars: usize,
    /// Ceiling for the final assembled string
    pub max_aggregate_chars: usize,
}

impl ContextLimits {
    /// Limits for context forwarded into a generation call
    pub fn generation() -> Self {
        Self {
            max_file_chars: limits::MAX_FILE_CHARS,
            max_readme_chars: limits::MAX_README_CHARS,
            max_aggregate_chars: limits::MAX_GENERATION_CONTEXT_CHARS,
        }
    }

    /// Limits for context reused as chat grounding
    pub fn chat() -> Self {
        Self {
            max_file_chars: limits::MAX_FILE_CHARS,
            max_readme_chars: limits::MAX_README_CHARS,
            max_aggregate_chars: limits::MAX_CHAT_CONTEXT_CHARS,
        }
    }
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self::generation()
    }
}

/// Assembles bounded grounding context from a connector's content.
pub struct ContextAssembler<'a> {
    connector: &'a dyn Connector,
    limits: ContextLimits,
    include_readme: bool,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(connector: &'a dyn Connector) -> Self {
        Self {
            connector,
            limits: ContextLimits::default(),
            include_readme: true,
        }
    }

    pub fn with_limits(mut self, limits: ContextLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn without_readme(mut self) -> Self {
        self.include_readme = false;
        self
    }

    /// Fetch and concatenate content for the selected files.
    ///
    /// Skips files that fail to fetch (logged, never fatal) unless nothing
    /// at all could be assembled; the README, when available, leads the
    /// output under its own smaller ceiling.
    pub async fn assemble(&self, ranked: &[RankedFile]) -> Result<String> {
        let mut out = String::new();
        let mut fetched = 0usize;
        let mut last_error: Option<DocloomError> = None;

        if self.include_readme {
            match self.connector.get_file_content("README.md").await {
                Ok(readme) => {
                    out.push_str("--- README.md ---\n");
                    out.push_str(&clamp_with_marker(
                        &readme,
                        self.limits.max_readme_chars,
                        limits::FILE_TRUNCATION_MARKER,
                    ));
                    out.push('\n');
                    fetched += 1;
                }
                Err(e) => debug!(error = %e, "No README available for context"),
            }
        }

        for file in ranked {
            match self.connector.get_file_content(&file.path).await {
                Ok(content) => {
                    out.push_str(&format!(
                        "\n--- FILE: {} ---\n{}\n",
                        file.path,
                        clamp_with_marker(
                            &content,
                            self.limits.max_file_chars,
                            limits::FILE_TRUNCATION_MARKER,
                        )
                    ));
                    fetched += 1;
                }
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    warn!(path = %file.path, error = %e, "Skipping file during context assembly");
                    last_error = Some(e);
                }
            }
        }

        // A single missing file is recoverable; losing every source is not.
        if fetched == 0 && !ranked.is_empty() {
            return Err(last_error
                .unwrap_or_else(|| DocloomError::Storage("no context sources".to_string())));
        }

        Ok(clamp_with_marker(
            &out,
            self.limits.max_aggregate_chars,
            limits::AGGREGATE_TRUNCATION_MARKER,
        ))
    }
}

/// Connector errors that must abort assembly instead of skipping a file.
fn is_fatal(e: &DocloomError) -> bool {
    matches!(
        e,
        DocloomError::SourceUnreachable { .. } | DocloomError::NotConnected { .. }
    )
}

/// Clamp a string to `max_chars` characters, appending `marker` when cut.
///
/// Operates on character boundaries, so multibyte content never splits.
pub fn clamp_with_marker(s: &str, max_chars: usize, marker: &str) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut out = String::with_capacity(byte_idx + marker.len());
            out.push_str(&s[..byte_idx]);
            out.push_str(marker);
            out
        }
        None => s.to_string(),
    }
}

/// Build chat grounding from the published sections of a repository.
///
/// Only published units participate; the result is clamped at the chat
/// aggregate ceiling.
pub fn published_sections_context(repo: &RepoId, units: &[GenerationUnit]) -> String {
    let mut out = format!("DOCUMENTATION FOR: {}\n\n", repo);

    for unit in units.iter().filter(|u| u.published) {
        out.push_str(&format!(
            "--- SECTION: {} ({}) ---\n{}\n\n",
            unit.title, unit.category, unit.content
        ));
    }

    clamp_with_marker(
        &out,
        limits::MAX_CHAT_CONTEXT_CHARS,
        limits::AGGREGATE_TRUNCATION_MARKER,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{Connector, SourceKind};
    use crate::types::{FileNode, ProjectMetadata, UnitStatus};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct MockConnector {
        files: HashMap<String, String>,
    }

    impl MockConnector {
        fn new(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(p, c)| (p.to_string(), c.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl Connector for MockConnector {
        fn kind(&self) -> SourceKind {
            SourceKind::Filesystem
        }

        fn identity_hint(&self) -> Option<RepoId> {
            None
        }

        async fn connect(&self) -> Result<ProjectMetadata> {
            unimplemented!("not used by assembler tests")
        }

        async fn scan(&self) -> Result<Vec<FileNode>> {
            Ok(Vec::new())
        }

        async fn get_file_content(&self, path: &str) -> Result<String> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| DocloomError::not_found(path))
        }

        async fn cached_tree(&self) -> Result<Arc<Vec<FileNode>>> {
            Ok(Arc::new(Vec::new()))
        }
    }

    fn ranked(paths: &[&str]) -> Vec<RankedFile> {
        paths
            .iter()
            .map(|p| RankedFile {
                path: p.to_string(),
                score: 1,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_assemble_with_delimiters_and_readme() {
        let connector = MockConnector::new(&[
            ("README.md", "# Project"),
            ("src/api.ts", "export route"),
        ]);

        let context = ContextAssembler::new(&connector)
            .assemble(&ranked(&["src/api.ts"]))
            .await
            .unwrap();

        assert!(context.starts_with("--- README.md ---\n# Project"));
        assert!(context.contains("\n--- FILE: src/api.ts ---\nexport route\n"));
    }

    #[tokio::test]
    async fn test_individual_file_truncated_at_ceiling() {
        let long = "x".repeat(12_000);
        let connector = MockConnector::new(&[("big.ts", &long)]);

        let context = ContextAssembler::new(&connector)
            .without_readme()
            .assemble(&ranked(&["big.ts"]))
            .await
            .unwrap();

        let body_start = context.find("---\n").unwrap() + 4;
        let body = &context[body_start..context.len() - 1];
        assert_eq!(
            body.chars().count(),
            limits::MAX_FILE_CHARS + limits::FILE_TRUNCATION_MARKER.chars().count()
        );
        assert!(body.ends_with(limits::FILE_TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn test_missing_file_skipped_not_fatal() {
        let connector = MockConnector::new(&[("kept.ts", "alive")]);

        let context = ContextAssembler::new(&connector)
            .without_readme()
            .assemble(&ranked(&["gone.ts", "kept.ts"]))
            .await
            .unwrap();

        assert!(context.contains("kept.ts"));
        assert!(!context.contains("gone.ts"));
    }

    #[tokio::test]
    async fn test_all_sources_missing_is_fatal() {
        let connector = MockConnector::new(&[]);

        let err = ContextAssembler::new(&connector)
            .without_readme()
            .assemble(&ranked(&["gone.ts"]))
            .await
            .unwrap_err();

        assert!(matches!(err, DocloomError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_selection_is_not_fatal() {
        let connector = MockConnector::new(&[]);
        let context = ContextAssembler::new(&connector)
            .without_readme()
            .assemble(&[])
            .await
            .unwrap();
        assert!(context.is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_ceiling_applies() {
        let chunk = "y".repeat(4_000);
        let files: Vec<(String, String)> = (0..20)
            .map(|i| (format!("f{}.ts", i), chunk.clone()))
            .collect();
        let refs: Vec<(&str, &str)> = files
            .iter()
            .map(|(p, c)| (p.as_str(), c.as_str()))
            .collect();
        let connector = MockConnector::new(&refs);

        let paths: Vec<&str> = files.iter().map(|(p, _)| p.as_str()).collect();
        let context = ContextAssembler::new(&connector)
            .without_readme()
            .with_limits(ContextLimits {
                max_file_chars: limits::MAX_FILE_CHARS,
                max_readme_chars: limits::MAX_README_CHARS,
                max_aggregate_chars: 10_000,
            })
            .assemble(&ranked(&paths))
            .await
            .unwrap();

        assert!(
            context.chars().count()
                <= 10_000 + limits::AGGREGATE_TRUNCATION_MARKER.chars().count()
        );
        assert!(context.ends_with(limits::AGGREGATE_TRUNCATION_MARKER));
    }

    #[test]
    fn test_clamp_char_boundary_safe() {
        let s = "héllo wörld".repeat(100);
        let clamped = clamp_with_marker(&s, 7, "...");
        assert_eq!(clamped.chars().count(), 10);
        assert!(clamped.ends_with("..."));

        // Under the ceiling: untouched
        assert_eq!(clamp_with_marker("short", 10, "..."), "short");
        // Exactly at the ceiling: untouched
        assert_eq!(clamp_with_marker("exact", 5, "..."), "exact");
    }

    #[test]
    fn test_published_sections_context() {
        let mut published =
            GenerationUnit::planned("a", "Quick Start", "Getting Started", "intro");
        published.content = "Run the thing.".to_string();
        published.status = UnitStatus::Generated;
        published.published = true;

        let mut draft = GenerationUnit::planned("b", "Internals", "Architecture", "deep");
        draft.content = "Secret draft.".to_string();
        draft.status = UnitStatus::Generated;

        let repo = RepoId::new("acme/widgets");
        let context = published_sections_context(&repo, &[published, draft]);

        assert!(context.starts_with("DOCUMENTATION FOR: acme/widgets\n\n"));
        assert!(context.contains("--- SECTION: Quick Start (Getting Started) ---\nRun the thing."));
        assert!(!context.contains("Secret draft"));
    }
}
