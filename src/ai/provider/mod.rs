//! Generation Provider Abstraction
//!
//! Defines the three entry points the pipeline needs from a generation
//! service: structural planning, per-page content, and streaming chat.
//! Providers own their wire format; callers only see domain types and a
//! chunk stream.

mod gemini;

pub use gemini::GeminiProvider;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::types::{ChatTurn, Result};

/// Incremental text chunks from a streaming chat call.
///
/// Finite and not restartable - a new call re-issues the full request.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Shared provider handle for pipeline stages.
pub type SharedProvider = Arc<dyn GenerationProvider>;

// =============================================================================
// Requests
// =============================================================================

/// Input to the structural planning call
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub repo_name: String,
    /// Flattened tree listing from the connector
    pub tree_text: String,
    /// Manifest content, when the project has one
    pub manifest: Option<String>,
    /// Assembled deep context
    pub context: String,
}

/// Input to the per-page content call
#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub repo_name: String,
    pub title: String,
    pub description: String,
    pub context: String,
}

/// Input to the streaming chat call.
///
/// `history` must already satisfy the starts-with-user contract; providers
/// reject violations rather than silently repairing them.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub history: Vec<ChatTurn>,
    pub context: String,
    pub query: String,
}

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for generation providers
///
/// API keys are never serialized to output and are redacted in debug
/// output; providers convert the key to SecretString internally.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider type: "gemini"
    pub provider: String,
    /// Model name (provider-specific)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Temperature for generation (0.0 = deterministic)
    pub temperature: f32,
    /// API key; never serialized to output
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for custom endpoints)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: None,
            timeout_secs: crate::constants::network::DEFAULT_TIMEOUT_SECS,
            temperature: 0.0,
            api_key: None,
            api_base: None,
        }
    }
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiProvider::new(config.clone())?)),
        _ => Err(crate::types::DocloomError::Config(format!(
            "Unknown provider: {}. Supported: gemini",
            config.provider
        ))),
    }
}

// =============================================================================
// Planned Sections
// =============================================================================

/// One entry of the planned documentation structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlannedSection {
    /// Model-supplied slug; backfilled from the title when absent
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

// =============================================================================
// Provider Trait
// =============================================================================

/// Generation service contract used by the pipeline
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Plan the documentation structure for a repository.
    ///
    /// Returns an ordered section list; order defines content-phase
    /// scheduling.
    async fn plan_structure(&self, request: &PlanRequest) -> Result<Vec<PlannedSection>>;

    /// Generate the markdown body for one planned page.
    async fn page_content(&self, request: &ContentRequest) -> Result<String>;

    /// Stream a grounded chat answer chunk-by-chunk.
    async fn chat_stream(&self, request: ChatRequest) -> Result<ChunkStream>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}
