pub mod manager;
pub mod model;

pub use manager::{TabManager, WindowManager};
pub use model::{CreateTab, CreateWindow, Tab, TabId, TabQuery, TabStatus, Window, WindowId, WindowKind};
