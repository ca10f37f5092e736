//! Loading and saving `config.toml`.
//!
//! A missing or empty file yields [`GoldenTabConfig::default`]; fields left
//! out of the file take their defaults.

use std::path::Path;

use goldentab_core::config::GoldenTabConfig;
use goldentab_core::error::{GoldenTabError, Result};

use crate::paths::{ensure_parent_dir, GoldenTabPaths};

/// Loads the configuration from `path`.
pub async fn load_config(path: &Path) -> Result<GoldenTabConfig> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("[Config] {:?} not found, using defaults", path);
            return Ok(GoldenTabConfig::default());
        }
        Err(e) => {
            return Err(GoldenTabError::io(format!(
                "Failed to read config file at {:?}: {}",
                path, e
            )));
        }
    };

    if content.trim().is_empty() {
        return Ok(GoldenTabConfig::default());
    }

    let config: GoldenTabConfig = toml::from_str(&content)
        .map_err(|e| GoldenTabError::config(format!("Failed to parse {:?}: {}", path, e)))?;
    tracing::debug!("[Config] Loaded {:?}", path);
    Ok(config)
}

/// Writes the configuration to `path`, creating its directory.
pub async fn save_config(path: &Path, config: &GoldenTabConfig) -> Result<()> {
    ensure_parent_dir(path).await?;
    let toml_string = toml::to_string_pretty(config)?;
    tokio::fs::write(path, toml_string).await?;
    tracing::info!("[Config] Saved {:?}", path);
    Ok(())
}

/// Loads the configuration from the location `paths` resolves to.
pub async fn load_default_config(paths: &GoldenTabPaths) -> Result<GoldenTabConfig> {
    load_config(&paths.config_file()?).await
}
