//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/docloom/config.toml)
//! 3. Project config (.docloom/config.toml)
//! 4. Environment variables (DOCLOOM_* prefix)
//!
//! Secrets are also picked up from their conventional environment
//! variables (`GEMINI_API_KEY`, `GITHUB_TOKEN`) when the config leaves
//! them unset.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;

use super::types::Config;
use crate::types::{DocloomError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults -> global -> project -> env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. DOCLOOM_PROVIDER_MODEL -> provider.model
        figment = figment.merge(Env::prefixed("DOCLOOM_").split('_').lowercase(true));

        let mut config: Config = figment
            .extract()
            .map_err(|e| DocloomError::Config(format!("Configuration error: {}", e)))?;

        if config.github.token.is_none() {
            config.github.token = std::env::var("GITHUB_TOKEN").ok();
        }
        if config.provider.api_key.is_none() {
            config.provider.api_key = std::env::var("GEMINI_API_KEY").ok();
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| DocloomError::Config(format!("Configuration error: {}", e)))
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/docloom/)
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "docloom").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".docloom/config.toml")
    }

    /// Get project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".docloom")
    }

    /// Resolve the database path: explicit config, else the platform data
    /// directory, else a project-local fallback.
    pub fn database_path(config: &Config) -> PathBuf {
        if let Some(path) = &config.storage.path {
            return path.clone();
        }
        ProjectDirs::from("", "", "docloom")
            .map(|dirs| dirs.data_dir().join("docloom.db"))
            .unwrap_or_else(|| Self::project_dir().join("docloom.db"))
    }

    /// Write a default project config, refusing to clobber without `force`.
    pub fn init_project(force: bool) -> Result<PathBuf> {
        let path = Self::project_config_path();
        if path.exists() && !force {
            return Err(DocloomError::Config(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(&Config::default())
            .map_err(|e| DocloomError::Config(format!("Failed to render config: {}", e)))?;
        std::fs::write(&path, rendered)?;
        Ok(path)
    }
}
