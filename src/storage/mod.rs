//! Storage Layer
//!
//! SQLite persistence: pooled connections, version-tracked migrations, and
//! the document store the pipeline upserts against.

pub mod database;
pub mod documents;

pub use database::{Database, PoolConfig, SharedDatabase};
pub use documents::{DocumentRecord, DocumentStore};
