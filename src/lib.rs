//! Docloom - Repository Ingestion and AI Context Assembly
//!
//! The core pipeline of an AI documentation generator: normalize a code
//! source behind one connector contract, select the files worth showing to
//! a model under strict size budgets, and drive a resumable two-phase
//! plan/content workflow against a persistent page store.
//!
//! ## Core Features
//!
//! - **Source Connectors**: filesystem and GitHub behind one async trait
//! - **Tree Reconstruction**: flat recursive listings rebuilt into a forest,
//!   order-independent and loss-free
//! - **Importance Ranking**: heuristic top-K file selection
//! - **Bounded Context**: per-file, README, and aggregate character ceilings
//! - **Idempotent Pipeline**: upserts keyed by `(owner, repo, title)` make
//!   repeated plan runs safe
//! - **Streamed Chat**: grounded answers over published pages, chunk by chunk
//!
//! ## Quick Start
//!
//! ```ignore
//! use docloom::{DocPlanner, PlanIntent, GitHubConnector};
//!
//! let connector = GitHubConnector::from_url("acme/widgets", None)?;
//! let planner = DocPlanner::new(store, provider, owner);
//! let outcome = planner.plan(&connector, PlanIntent::Open).await?;
//! ```
//!
//! ## Modules
//!
//! - [`connector`]: source adapters and tree reconstruction
//! - [`ranking`]: documentation-value heuristics
//! - [`context`]: bounded context assembly
//! - [`ai`]: provider abstraction, prompts, validation, history sanitizer
//! - [`pipeline`]: plan phase, content queue, grounded chat
//! - [`storage`]: SQLite persistence with connection pooling
//! - [`config`]: layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod connector;
pub mod constants;
pub mod context;
pub mod pipeline;
pub mod ranking;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{DocloomError, GenerationPhase, Result, ResultExt};

// Domain Types
pub use types::{
    ChatRole, ChatTurn, FileNode, GenerationUnit, NodeKind, OwnerId, ProjectMetadata,
    RankedFile, RepoId, UnitKey, UnitStatus,
};

// Storage
pub use storage::database::PoolConfig;
pub use storage::{Database, DocumentStore, SharedDatabase};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use pipeline::{
    ContentGenerator, DocPlanner, PlanIntent, PlanOutcome, RunSummary, answer_in_context,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    ChunkStream,
    GeminiProvider,
    GenerationProvider,
    PlannedSection,
    ProviderConfig,
    SharedProvider,
    create_provider,
    sanitize_history,
};

// =============================================================================
// Connector Re-exports
// =============================================================================

pub use connector::{Connector, FilesystemConnector, GitHubConnector, SharedConnector, SourceKind};
pub use context::{ContextAssembler, ContextLimits};
pub use ranking::ImportanceScorer;
