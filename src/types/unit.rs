//! Documentation unit and chat types
//!
//! A `GenerationUnit` is one planned documentation page moving through the
//! `Planned -> Generating -> Generated | Failed` lifecycle. Two units are the
//! same page iff they share `(owner, repo, title)` - the idempotency key that
//! keeps repeated plan invocations from duplicating persisted rows.

use serde::{Deserialize, Serialize};

// =============================================================================
// Unit Status
// =============================================================================

/// Lifecycle state of a documentation page
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    /// Planned by the structure phase, content still empty
    #[default]
    Planned,
    /// Content generation in flight
    Generating,
    /// Content generated successfully
    Generated,
    /// Content generation failed; `content` holds the surfaced error text
    Failed,
}

impl UnitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Generating => "generating",
            Self::Generated => "generated",
            Self::Failed => "failed",
        }
    }

    /// Parse a stored status, falling back to `Planned` for unknown values.
    ///
    /// Logs a warning so data corruption is visible rather than silent.
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "planned" => Self::Planned,
            "generating" => Self::Generating,
            "generated" => Self::Generated,
            "failed" => Self::Failed,
            other => {
                tracing::warn!("Invalid UnitStatus value '{}', using default", other);
                Self::Planned
            }
        }
    }
}

// =============================================================================
// Unit Key
// =============================================================================

/// The `(owner, repo, title)` triple identifying one page across invocations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitKey {
    pub owner: String,
    pub repo: String,
    pub title: String,
}

impl UnitKey {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            title: title.into(),
        }
    }
}

impl std::fmt::Display for UnitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.title)
    }
}

// =============================================================================
// Generation Unit
// =============================================================================

/// One planned or generated documentation page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationUnit {
    /// Plan-phase identifier (slug from the model, or store row id once bound)
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    /// Markdown body; empty while `Planned`, error text when `Failed`
    pub content: String,
    pub status: UnitStatus,
    /// Persistent store row id, set once the unit is first written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub published: bool,
}

impl GenerationUnit {
    /// Create a freshly planned unit with empty content
    pub fn planned(
        id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: category.into(),
            description: description.into(),
            content: String::new(),
            status: UnitStatus::Planned,
            document_id: None,
            published: false,
        }
    }

    /// A unit counts as a draft until it carries real content
    pub fn is_draft(&self) -> bool {
        self.content.trim().is_empty()
    }
}

// =============================================================================
// Chat Turns
// =============================================================================

/// Speaker role in a conversation transcript
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of a conversation transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            UnitStatus::Planned,
            UnitStatus::Generating,
            UnitStatus::Generated,
            UnitStatus::Failed,
        ] {
            assert_eq!(UnitStatus::parse_or_default(status.as_str()), status);
        }
    }

    #[test]
    fn test_status_falls_back_on_garbage() {
        assert_eq!(UnitStatus::parse_or_default("exploded"), UnitStatus::Planned);
    }

    #[test]
    fn test_unit_draft_detection() {
        let mut unit = GenerationUnit::planned("intro", "Introduction", "Getting Started", "");
        assert!(unit.is_draft());

        unit.content = "   \n".to_string();
        assert!(unit.is_draft());

        unit.content = "## Overview".to_string();
        assert!(!unit.is_draft());
    }

    #[test]
    fn test_unit_key_display() {
        let key = UnitKey::new("alice", "acme/api", "Quick Start");
        assert_eq!(key.to_string(), "alice/acme/api#Quick Start");
    }
}
