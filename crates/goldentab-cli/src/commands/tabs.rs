use anyhow::Result;
use goldentab_core::tab::{CreateTab, TabManager, TabQuery};

use super::Runtime;

pub async fn open(runtime: &Runtime, url: &str) -> Result<()> {
    let window_id = runtime.context.window_id();
    let tab = TabManager::create(runtime.browser.as_ref(), CreateTab::foreground(url, window_id)).await?;
    println!("Opened tab {} at index {}", tab.id, tab.index);
    Ok(())
}

pub async fn list(runtime: &Runtime) -> Result<()> {
    let window_id = runtime.context.window_id();
    let tabs = TabManager::query(runtime.browser.as_ref(), TabQuery::in_window(window_id)).await?;
    for tab in tabs {
        let marker = if tab.active { "*" } else { " " };
        let kind = if runtime.config.is_management_url(&tab.url) {
            " (management)"
        } else {
            ""
        };
        println!("{} {:>4}  {}{}", marker, tab.id, tab.url, kind);
    }
    Ok(())
}
