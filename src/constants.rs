//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Repository scanning constants
pub mod scan {
    /// Directories excluded from every scan, regardless of source.
    ///
    /// Covers dependency caches, version-control metadata, and build output.
    pub const IGNORED_DIRS: &[&str] = &[
        "node_modules",
        ".git",
        ".next",
        "dist",
        "build",
        "target",
        "__pycache__",
        "vendor",
        ".venv",
    ];

    /// Maximum file size eligible for content fetch (1MB)
    pub const MAX_FILE_SIZE: u64 = 1_048_576;
}

/// Importance ranking constants
pub mod ranking {
    /// Default number of top-ranked files returned
    pub const DEFAULT_LIMIT: usize = 15;

    /// Extensions considered worth feeding to the model
    pub const ALLOWED_EXTENSIONS: &[&str] = &[
        "ts", "tsx", "js", "jsx", "py", "go", "rs", "java", "cpp", "c", "html", "css",
    ];

    /// Score bonus for routing/API entry points
    pub const ROUTE_BONUS: u32 = 10;
    /// Score bonus for pages and views
    pub const PAGE_BONUS: u32 = 8;
    /// Score bonus for data models, schemas, and type definitions
    pub const MODEL_BONUS: u32 = 7;
    /// Score bonus for shared services, libraries, and utilities
    pub const SERVICE_BONUS: u32 = 5;
    /// Score bonus for conventional entry files (index, main, app)
    pub const ENTRY_BONUS: u32 = 5;
    /// Score bonus for leading-uppercase filenames (component convention)
    pub const COMPONENT_BONUS: u32 = 3;
}

/// Context assembly constants
pub mod context {
    /// Per-file content ceiling in characters
    pub const MAX_FILE_CHARS: usize = 5_000;

    /// README content ceiling in characters
    pub const MAX_README_CHARS: usize = 3_000;

    /// Aggregate ceiling when context grounds a chat session
    pub const MAX_CHAT_CONTEXT_CHARS: usize = 500_000;

    /// Aggregate ceiling when context is forwarded into a generation call
    pub const MAX_GENERATION_CONTEXT_CHARS: usize = 50_000;

    /// Marker appended when a single file is cut at its ceiling
    pub const FILE_TRUNCATION_MARKER: &str = "\n...[TRUNCATED]";

    /// Marker appended when the aggregate string is cut at its ceiling
    pub const AGGREGATE_TRUNCATION_MARKER: &str = "\n...(truncated)...";
}

/// Prompt input ceilings (characters)
///
/// Each prompt section is clamped independently so one oversized input
/// cannot crowd out the others.
pub mod prompt {
    /// File tree listing ceiling inside the plan prompt
    pub const MAX_TREE_CHARS: usize = 10_000;

    /// Manifest content ceiling inside the plan prompt
    pub const MAX_MANIFEST_CHARS: usize = 5_000;

    /// Deep context ceiling inside plan and content prompts
    pub const MAX_CONTEXT_CHARS: usize = 40_000;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

    /// Maximum retries for transient request failures
    pub const MAX_TRANSIENT_RETRIES: usize = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 30;

    /// User-Agent sent to the GitHub API (required by the API)
    pub const USER_AGENT: &str = concat!("docloom/", env!("CARGO_PKG_VERSION"));
}
