//! Concrete adapters for the goldentab core: an in-memory browser host,
//! key-value storage backends, path resolution and config file handling.

pub mod config_storage;
pub mod json_storage;
pub mod memory_browser;
pub mod memory_storage;
pub mod paths;

pub use crate::config_storage::{load_config, load_default_config, save_config};
pub use crate::json_storage::JsonFileStorage;
pub use crate::memory_browser::{BrowserProfile, InMemoryBrowser, BOOKMARKS_BAR_ID, OTHER_BOOKMARKS_ID, ROOT_ID};
pub use crate::memory_storage::MemoryStorage;
pub use crate::paths::GoldenTabPaths;
