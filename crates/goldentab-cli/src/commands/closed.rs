use anyhow::{bail, Result};

use super::Runtime;

pub async fn list(runtime: &Runtime) -> Result<()> {
    let Some(workspace_id) = runtime.context.active_workspace_id().await? else {
        bail!("No active workspace");
    };
    let closed = runtime.context.closed_tabs().closed_tabs(&workspace_id).await;
    if closed.is_empty() {
        println!("No recently closed tabs");
        return Ok(());
    }
    for entry in closed {
        println!("{:>6}  {}  {}", entry.id, entry.title, entry.url().unwrap_or_default());
    }
    Ok(())
}

pub async fn reopen(runtime: &Runtime, id: &str) -> Result<()> {
    let ctx = &runtime.context;
    match ctx.closed_tabs().reopen_closed_tab(id, ctx.window_id()).await? {
        Some(tab) => println!("Reopened {} as tab {}", tab.url, tab.id),
        None => bail!("Entry {} has no URL", id),
    }
    Ok(())
}
