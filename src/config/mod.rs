//! Configuration
//!
//! Layered configuration (defaults, global TOML, project TOML, environment)
//! with validation.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{
    Config, ContextConfig, GitHubConfig, OwnerConfig, ScanConfig, StorageConfig,
};
