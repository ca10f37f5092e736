pub mod annotate;
pub mod closed;
pub mod tabs;
pub mod tidy;
pub mod workspace;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use goldentab_core::config::GoldenTabConfig;
use goldentab_core::tab::{CreateTab, TabManager, WindowManager};
use goldentab_core::workspace::WorkspaceContext;
use goldentab_infrastructure::{load_default_config, GoldenTabPaths, InMemoryBrowser, JsonFileStorage};

/// Everything one CLI invocation works with.
///
/// The simulated browser is loaded from its profile file at start and
/// written back by [`Runtime::save`].
pub struct Runtime {
    pub browser: Arc<InMemoryBrowser>,
    pub config: GoldenTabConfig,
    pub context: WorkspaceContext,
    profile_path: PathBuf,
}

impl Runtime {
    pub async fn open(profile: Option<PathBuf>, storage: Option<PathBuf>) -> Result<Self> {
        let mut paths = GoldenTabPaths::default();
        if let Some(profile) = profile {
            paths = paths.with_profile_file(profile);
        }
        if let Some(storage) = storage {
            paths = paths.with_storage_file(storage);
        }

        let config = load_default_config(&paths)
            .await
            .context("Failed to load configuration")?;

        let profile_path = paths.profile_file()?;
        let fresh = !profile_path.exists();
        let browser = Arc::new(
            InMemoryBrowser::load(&profile_path)
                .await
                .with_context(|| format!("Failed to load profile {}", profile_path.display()))?,
        );

        let storage_path = paths.storage_file()?;
        let storage = Arc::new(
            JsonFileStorage::open(&storage_path)
                .await
                .with_context(|| format!("Failed to open storage {}", storage_path.display()))?,
        );

        let window = WindowManager::get_current(browser.as_ref()).await?;
        if fresh {
            // A new profile starts with the management page open, as after install.
            TabManager::create(
                browser.as_ref(),
                CreateTab::foreground(config.management_page_url.as_str(), window.id),
            )
            .await?;
        }

        let context = WorkspaceContext::new(
            window.id,
            browser.clone(),
            browser.clone(),
            storage,
            config.clone(),
        );
        tracing::debug!("[CLI] Window {} ready", window.id);

        Ok(Self {
            browser,
            config,
            context,
            profile_path,
        })
    }

    pub async fn save(&self) -> Result<()> {
        self.browser
            .save(&self.profile_path)
            .await
            .with_context(|| format!("Failed to save profile {}", self.profile_path.display()))
    }
}
