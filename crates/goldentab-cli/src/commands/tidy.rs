use anyhow::Result;

use super::Runtime;

pub async fn dedup_tabs(runtime: &Runtime) -> Result<()> {
    let closed = runtime.context.close_duplicate_tabs().await?;
    if closed == 0 {
        println!("No duplicate tabs");
    } else {
        println!("Closed {} duplicate tab(s)", closed);
    }
    Ok(())
}

pub async fn sort_tabs(runtime: &Runtime) -> Result<()> {
    let moved = runtime.context.sort_tabs_by_website().await?;
    println!("Sorted {} tab(s) by website", moved);
    Ok(())
}

pub async fn dedup_folder(runtime: &Runtime, folder_id: &str) -> Result<()> {
    let removed = runtime.context.housekeeper().deduplicate_folder(folder_id).await?;
    if removed == 0 {
        println!("No duplicates found");
    } else {
        println!("Removed {} duplicate bookmark(s)", removed);
    }
    Ok(())
}

pub async fn sort_folder(runtime: &Runtime, folder_id: &str) -> Result<()> {
    let count = runtime.context.housekeeper().sort_folder(folder_id).await?;
    println!("Sorted {} item(s)", count);
    Ok(())
}
