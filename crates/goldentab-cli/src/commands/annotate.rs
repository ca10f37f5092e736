use anyhow::Result;
use goldentab_core::bookmark::MetadataEditor;
use goldentab_core::metadata::display_title;

use super::Runtime;

fn editor(runtime: &Runtime) -> MetadataEditor {
    MetadataEditor::new(runtime.browser.clone(), runtime.config.note_max_len)
}

pub async fn star(runtime: &Runtime, id: &str) -> Result<()> {
    let starred = editor(runtime).toggle_starred(id).await?;
    println!("{} {}", id, if starred { "starred" } else { "unstarred" });
    Ok(())
}

pub async fn mark_workspace(runtime: &Runtime, id: &str, workspace: bool) -> Result<()> {
    let node = editor(runtime).set_workspace(id, workspace).await?;
    let title = display_title(&node.title);
    if workspace {
        println!("'{}' is now a workspace", title);
    } else {
        println!("'{}' is no longer a workspace", title);
    }
    Ok(())
}

pub async fn note(runtime: &Runtime, id: &str, text: Option<&str>) -> Result<()> {
    let editor = editor(runtime);
    let node = match text {
        Some(text) => editor.set_note(id, text).await?,
        None => editor.clear_note(id).await?,
    };
    println!("{}", node.title);
    Ok(())
}
