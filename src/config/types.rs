//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/docloom/) and project (.docloom/) level
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ai::provider::ProviderConfig;
use crate::constants::{context, ranking};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Identity persisted pages are keyed under
    pub owner: OwnerConfig,

    /// Source scanning settings
    pub scan: ScanConfig,

    /// Context assembly ceilings
    pub context: ContextConfig,

    /// Generation provider settings
    pub provider: ProviderConfig,

    /// Source credentials
    pub github: GitHubConfig,

    /// Storage settings
    pub storage: StorageConfig,
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `DocloomError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(crate::types::DocloomError::Config(format!(
                "provider temperature must be between 0.0 and 2.0, got {}",
                self.provider.temperature
            )));
        }

        if self.provider.timeout_secs == 0 {
            return Err(crate::types::DocloomError::Config(
                "provider timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.scan.rank_limit == 0 {
            return Err(crate::types::DocloomError::Config(
                "scan rank_limit must be greater than 0".to_string(),
            ));
        }

        if self.context.max_file_chars == 0 || self.context.max_aggregate_chars == 0 {
            return Err(crate::types::DocloomError::Config(
                "context ceilings must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Owner Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnerConfig {
    /// Owner identity for persisted pages
    pub name: String,
}

impl Default for OwnerConfig {
    fn default() -> Self {
        Self {
            name: "local".to_string(),
        }
    }
}

// =============================================================================
// Scan Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of top-ranked files fed to the model
    pub rank_limit: usize,

    /// Additional glob patterns excluded from filesystem scans
    pub exclude: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            rank_limit: ranking::DEFAULT_LIMIT,
            exclude: Vec::new(),
        }
    }
}

// =============================================================================
// Context Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Per-file content ceiling (characters)
    pub max_file_chars: usize,

    /// README ceiling (characters)
    pub max_readme_chars: usize,

    /// Aggregate ceiling for generation context (characters)
    pub max_aggregate_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_file_chars: context::MAX_FILE_CHARS,
            max_readme_chars: context::MAX_README_CHARS,
            max_aggregate_chars: context::MAX_GENERATION_CONTEXT_CHARS,
        }
    }
}

impl ContextConfig {
    pub fn limits(&self) -> crate::context::ContextLimits {
        crate::context::ContextLimits {
            max_file_chars: self.max_file_chars,
            max_readme_chars: self.max_readme_chars,
            max_aggregate_chars: self.max_aggregate_chars,
        }
    }
}

// =============================================================================
// GitHub Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GitHubConfig {
    /// Bearer token for private repositories; never serialized to output
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

// =============================================================================
// Storage Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Database path; defaults to the platform data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = Config::default();
        config.provider.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = Config::default();
        config.scan.rank_limit = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.context.max_aggregate_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secrets_never_serialized() {
        let mut config = Config::default();
        config.github.token = Some("ghp_secret".to_string());
        config.provider.api_key = Some("sk-secret".to_string());

        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("ghp_secret"));
        assert!(!rendered.contains("sk-secret"));
    }
}
