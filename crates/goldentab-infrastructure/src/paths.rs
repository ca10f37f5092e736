//! Unified path management for goldentab files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/goldentab/         # Config directory
//! ├── config.toml              # GoldenTabConfig
//! ├── storage.json             # Key-value storage (bindings, focus memory)
//! └── profile.json             # Simulated browser profile used by the CLI
//! ```

use std::path::{Path, PathBuf};

use goldentab_core::error::{GoldenTabError, Result};

const APP_DIR_NAME: &str = "goldentab";
const CONFIG_FILE_NAME: &str = "config.toml";
const STORAGE_FILE_NAME: &str = "storage.json";
const PROFILE_FILE_NAME: &str = "profile.json";

/// Resolves where goldentab keeps its files.
///
/// Every location defaults to the platform config directory and can be
/// overridden individually.
#[derive(Debug, Clone, Default)]
pub struct GoldenTabPaths {
    base_dir: Option<PathBuf>,
    config_file: Option<PathBuf>,
    storage_file: Option<PathBuf>,
    profile_file: Option<PathBuf>,
}

impl GoldenTabPaths {
    /// Creates a resolver. `base_dir` replaces the platform config directory.
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self {
            base_dir,
            ..Default::default()
        }
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_storage_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_file = Some(path.into());
        self
    }

    pub fn with_profile_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.profile_file = Some(path.into());
        self
    }

    /// Returns the goldentab configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/goldentab/`)
    /// - `Err(GoldenTabError::Config)`: The platform config directory is unknown
    pub fn config_dir(&self) -> Result<PathBuf> {
        if let Some(base) = &self.base_dir {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or_else(|| GoldenTabError::config("Cannot find config directory"))
    }

    pub fn config_file(&self) -> Result<PathBuf> {
        self.resolve(&self.config_file, CONFIG_FILE_NAME)
    }

    pub fn storage_file(&self) -> Result<PathBuf> {
        self.resolve(&self.storage_file, STORAGE_FILE_NAME)
    }

    pub fn profile_file(&self) -> Result<PathBuf> {
        self.resolve(&self.profile_file, PROFILE_FILE_NAME)
    }

    fn resolve(&self, explicit: &Option<PathBuf>, file_name: &str) -> Result<PathBuf> {
        match explicit {
            Some(path) => Ok(path.clone()),
            None => Ok(self.config_dir()?.join(file_name)),
        }
    }
}

/// Creates the parent directory of `path` if it does not exist yet.
pub(crate) async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}
