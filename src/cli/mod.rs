//! CLI Layer
//!
//! Command implementations plus the shared application context that wires
//! config, storage, and the generation provider together.

pub mod commands;
pub mod output;

use std::path::Path;
use std::sync::Arc;

use crate::ai::provider::{SharedProvider, create_provider};
use crate::config::{Config, ConfigLoader};
use crate::connector::{FilesystemConnector, GitHubConnector, SharedConnector};
use crate::storage::{Database, DocumentStore};
use crate::types::{OwnerId, Result};

/// Shared wiring for every command that touches the pipeline.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<DocumentStore>,
    pub provider: SharedProvider,
    pub owner: OwnerId,
}

impl AppContext {
    /// Load config, open the database, and build the provider.
    pub fn init() -> Result<Self> {
        let config = ConfigLoader::load()?;
        let db = Database::open(ConfigLoader::database_path(&config))?;
        let store = Arc::new(DocumentStore::new(Arc::new(db)));
        let provider = create_provider(&config.provider)?;
        let owner = OwnerId::new(config.owner.name.clone());

        Ok(Self {
            config,
            store,
            provider,
            owner,
        })
    }

    /// Wiring without a provider, for commands that never generate.
    pub fn init_offline() -> Result<Self> {
        let config = ConfigLoader::load()?;
        let db = Database::open(ConfigLoader::database_path(&config))?;
        let store = Arc::new(DocumentStore::new(Arc::new(db)));
        let owner = OwnerId::new(config.owner.name.clone());

        Ok(Self {
            provider: Arc::new(NullProvider),
            config,
            store,
            owner,
        })
    }
}

/// Pick a connector for a source argument: an existing local directory
/// scans the filesystem, anything else must parse as a GitHub repository.
pub fn make_connector(source: &str, config: &Config) -> Result<SharedConnector> {
    if Path::new(source).exists() {
        let connector = FilesystemConnector::new(source)
            .with_exclude(config.scan.exclude.clone());
        return Ok(Arc::new(connector));
    }

    Ok(Arc::new(GitHubConnector::from_url(
        source,
        config.github.token.clone(),
    )?))
}

/// Provider stub for offline commands; any generation call is a bug.
struct NullProvider;

#[async_trait::async_trait]
impl crate::ai::provider::GenerationProvider for NullProvider {
    async fn plan_structure(
        &self,
        _request: &crate::ai::provider::PlanRequest,
    ) -> Result<Vec<crate::ai::provider::PlannedSection>> {
        Err(crate::types::DocloomError::Config(
            "this command does not generate".to_string(),
        ))
    }

    async fn page_content(
        &self,
        _request: &crate::ai::provider::ContentRequest,
    ) -> Result<String> {
        Err(crate::types::DocloomError::Config(
            "this command does not generate".to_string(),
        ))
    }

    async fn chat_stream(
        &self,
        _request: crate::ai::provider::ChatRequest,
    ) -> Result<crate::ai::provider::ChunkStream> {
        Err(crate::types::DocloomError::Config(
            "this command does not generate".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "null"
    }

    fn model(&self) -> &str {
        "none"
    }
}
