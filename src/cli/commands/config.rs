//! `docloom config` - inspect and initialize configuration.

use crate::cli::output::Output;
use crate::config::ConfigLoader;
use crate::types::{DocloomError, Result};

/// Show the merged configuration.
pub fn show() -> Result<()> {
    let config = ConfigLoader::load()?;
    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| DocloomError::Config(format!("Failed to render config: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

/// Show configuration file paths.
pub fn path() -> Result<()> {
    let out = Output::new();
    out.header("Configuration paths");
    if let Some(global) = ConfigLoader::global_config_path() {
        let marker = if global.exists() { "" } else { " (absent)" };
        out.item("global ", &format!("{}{}", global.display(), marker));
    }
    let project = ConfigLoader::project_config_path();
    let marker = if project.exists() { "" } else { " (absent)" };
    out.item("project", &format!("{}{}", project.display(), marker));
    Ok(())
}

/// Write a default project config file.
pub fn init(force: bool) -> Result<()> {
    let out = Output::new();
    let path = ConfigLoader::init_project(force)?;
    out.success(&format!("Wrote {}", path.display()));
    Ok(())
}
