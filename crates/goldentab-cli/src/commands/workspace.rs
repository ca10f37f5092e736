use anyhow::{bail, Result};
use goldentab_core::bookmark::{BookmarkNode, BookmarkStore};
use goldentab_core::filter::{find_workspaces, WorkspaceSummary};
use goldentab_core::metadata::display_title;
use goldentab_core::tab::{Tab, WindowId};
use goldentab_core::workspace::{ActivationOutcome, DeactivationOutcome, LooseTabsChoice};
use serde_json::{json, Value};

use super::Runtime;

pub async fn list(runtime: &Runtime, as_json: bool) -> Result<()> {
    let tree = BookmarkStore::get_tree(runtime.browser.as_ref()).await?;
    let active = runtime.context.active_workspace_id().await?;

    let workspaces: Vec<_> = tree.iter().flat_map(find_workspaces).collect();
    if as_json {
        let listing = workspaces_json(&workspaces, active.as_deref());
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }
    if workspaces.is_empty() {
        println!("No workspaces. Mark a folder with `goldentab mark-workspace <id>`.");
        return Ok(());
    }
    for ws in workspaces {
        let marker = if active.as_deref() == Some(ws.id.as_str()) { "*" } else { " " };
        println!("{} {:>6}  {}", marker, ws.id, ws.title);
    }
    Ok(())
}

pub async fn status(runtime: &Runtime, as_json: bool) -> Result<()> {
    let ctx = &runtime.context;
    let folder = ctx.get_active_workspace_folder().await?;
    let tabs = ctx.current_window_tabs().await?;

    if as_json {
        let status = status_json(ctx.window_id(), folder.as_ref(), &tabs);
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Window: {}", ctx.window_id());
    match folder {
        Some(folder) => println!("Workspace: {} ({})", display_title(&folder.title), folder.id),
        None => println!("Workspace: none"),
    }
    println!("Tabs: {}", tabs.len());
    Ok(())
}

pub async fn activate(runtime: &Runtime, id: &str, loose: LooseTabsChoice) -> Result<()> {
    let outcome = runtime.context.switch_workspace(id, Some(&loose)).await;
    match outcome.activation {
        ActivationOutcome::Activated { restored, merged } => {
            println!("Activated workspace {}: {} tab(s) restored", id, restored);
            if merged > 0 {
                println!("Brought {} open tab(s) into the workspace", merged);
            }
            Ok(())
        }
        ActivationOutcome::Cancelled => {
            println!("Cancelled; nothing changed");
            Ok(())
        }
        ActivationOutcome::Failed(e) => bail!("Failed to activate workspace {}: {}", id, e),
    }
}

pub async fn deactivate(runtime: &Runtime) -> Result<()> {
    match runtime.context.leave_workspace().await {
        DeactivationOutcome::Deactivated { saved } => {
            println!("Workspace closed; {} tab(s) saved", saved);
            Ok(())
        }
        DeactivationOutcome::NotActive => {
            println!("No active workspace");
            Ok(())
        }
        DeactivationOutcome::Failed(e) => bail!("Failed to deactivate: {}", e),
    }
}

pub async fn open_window(runtime: &Runtime, id: &str) -> Result<()> {
    let (context, outcome) = runtime
        .context
        .open_in_new_window(runtime.browser.as_ref(), id)
        .await?;
    match outcome {
        ActivationOutcome::Activated { restored, .. } => {
            println!(
                "Opened workspace {} in window {}: {} tab(s) restored",
                id,
                context.window_id(),
                restored
            );
            Ok(())
        }
        ActivationOutcome::Cancelled => Ok(()),
        ActivationOutcome::Failed(e) => bail!("Failed to open workspace {}: {}", id, e),
    }
}

fn workspaces_json(workspaces: &[WorkspaceSummary], active: Option<&str>) -> Value {
    workspaces
        .iter()
        .map(|ws| {
            json!({
                "id": ws.id,
                "title": ws.title,
                "active": active == Some(ws.id.as_str()),
            })
        })
        .collect()
}

fn status_json(window_id: WindowId, folder: Option<&BookmarkNode>, tabs: &[Tab]) -> Value {
    let workspace = folder.map(|f| json!({"id": f.id, "title": display_title(&f.title)}));
    json!({
        "window": window_id,
        "workspace": workspace,
        "tabs": tabs.iter().map(|t| t.url.as_str()).collect::<Vec<_>>(),
    })
}
