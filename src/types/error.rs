//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Taxonomy
//!
//! - **SourceUnreachable**: connector cannot establish identity (fatal, surfaced immediately)
//! - **NotFound / NotAFile**: single-file fetch failure (recoverable, skip-and-continue
//!   at the assembler layer)
//! - **Generation**: plan, content, or chat call against the generation service failed
//! - **InvalidHistory**: chat history violates the start-with-user contract (the
//!   sanitizer is responsible for preventing this from reaching the provider)
//!
//! ## Design Principles
//!
//! - Single unified error type (DocloomError) for the entire application
//! - Structured variants with context for better debugging
//! - Transience classification for retry decisions
//! - No panic/unwrap - all errors are recoverable

use thiserror::Error;

// =============================================================================
// Generation Phases
// =============================================================================

/// Which pipeline phase a generation-service error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    /// Structural planning call
    Plan,
    /// Per-page content call
    Content,
    /// Streaming chat call
    Chat,
}

impl std::fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plan => write!(f, "plan"),
            Self::Content => write!(f, "content"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum DocloomError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // -------------------------------------------------------------------------
    // Connector Errors
    // -------------------------------------------------------------------------
    /// The source root does not exist, is the wrong kind, or access failed.
    /// Fatal to the whole operation.
    #[error("Source unreachable ({source_id}): {reason}")]
    SourceUnreachable { source_id: String, reason: String },

    /// A requested path does not exist in the source
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// A requested path resolves to a directory, not a file
    #[error("Not a file: {path}")]
    NotAFile { path: String },

    /// `scan()`/`get_file_content()` called before a successful `connect()`
    #[error("Connector not connected: call connect() before {operation}")]
    NotConnected { operation: &'static str },

    // -------------------------------------------------------------------------
    // Generation Errors
    // -------------------------------------------------------------------------
    /// The generation service rejected or failed a call
    #[error("Generation {phase} failed: {message}")]
    Generation {
        phase: GenerationPhase,
        message: String,
    },

    /// Chat history does not satisfy the must-start-with-user contract
    #[error("Invalid chat history: {0}")]
    InvalidHistory(String),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DocloomError {
    /// Create a source-unreachable error
    pub fn unreachable(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnreachable {
            source_id: source_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a not-a-file error
    pub fn not_a_file(path: impl Into<String>) -> Self {
        Self::NotAFile { path: path.into() }
    }

    /// Create a not-connected error for an operation name
    pub fn not_connected(operation: &'static str) -> Self {
        Self::NotConnected { operation }
    }

    /// Create a generation-service error for a phase
    pub fn generation(phase: GenerationPhase, message: impl Into<String>) -> Self {
        Self::Generation {
            phase,
            message: message.into(),
        }
    }

    /// Check whether this error names a single missing/mistyped file.
    ///
    /// The assembler skips these and continues; everything else propagates.
    pub fn is_skippable_fetch(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NotAFile { .. })
    }

    /// Check whether a retry on the same endpoint may succeed.
    ///
    /// Drives backon retry policies for network-facing calls.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || has_transient_status(e),
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}

fn has_transient_status(e: &reqwest::Error) -> bool {
    e.status()
        .map(|s| s.is_server_error() || s.as_u16() == 429)
        .unwrap_or(false)
}

pub type Result<T> = std::result::Result<T, DocloomError>;

// =============================================================================
// Context Extension
// =============================================================================

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| DocloomError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| DocloomError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================
