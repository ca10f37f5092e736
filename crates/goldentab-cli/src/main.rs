use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use goldentab_core::workspace::LooseTabsChoice;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Runtime;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "GOLDENTAB_LOG";

#[derive(Parser)]
#[command(name = "goldentab")]
#[command(about = "GoldenTab - bookmark-backed workspaces for browser windows", long_about = None)]
struct Cli {
    /// Simulated browser profile (JSON)
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Key-value storage file (JSON)
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List workspace folders
    Workspaces {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the window's active workspace and tabs
    Status {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Activate a workspace in the current window
    Activate {
        /// Workspace folder id
        id: String,
        /// What to do with open tabs when no workspace is active
        #[arg(long, default_value = "bring-in")]
        loose: LooseTabsChoice,
    },
    /// Save and close the active workspace
    Deactivate,
    /// Open a workspace in a new window
    OpenWindow {
        /// Workspace folder id
        id: String,
    },
    /// Recently closed tabs of the active workspace
    Closed {
        #[command(subcommand)]
        action: ClosedAction,
    },
    /// Toggle the starred flag of a bookmark or folder
    Star { id: String },
    /// Mark a folder as a workspace
    MarkWorkspace {
        id: String,
        /// Remove the workspace flag instead
        #[arg(long)]
        off: bool,
    },
    /// Set a note on a bookmark; without text the note is removed
    Note { id: String, text: Option<String> },
    /// Open a tab in the current window
    Open { url: String },
    /// List the tabs of the current window
    Tabs,
    /// Close tabs that repeat another tab's URL
    DedupTabs,
    /// Group the window's tabs by website
    SortTabs,
    /// Remove bookmarks that repeat a sibling's URL
    DedupFolder { id: String },
    /// Sort a folder: subfolders first, then bookmarks, by title
    SortFolder { id: String },
}

#[derive(Subcommand)]
enum ClosedAction {
    /// List closed tabs, most recent first
    List,
    /// Reopen a closed tab and drop it from the list
    Reopen { id: String },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let runtime = Runtime::open(cli.profile, cli.storage).await?;

    match cli.command {
        Commands::Workspaces { json } => commands::workspace::list(&runtime, json).await?,
        Commands::Status { json } => commands::workspace::status(&runtime, json).await?,
        Commands::Activate { id, loose } => {
            commands::workspace::activate(&runtime, &id, loose).await?
        }
        Commands::Deactivate => commands::workspace::deactivate(&runtime).await?,
        Commands::OpenWindow { id } => commands::workspace::open_window(&runtime, &id).await?,
        Commands::Closed { action } => match action {
            ClosedAction::List => commands::closed::list(&runtime).await?,
            ClosedAction::Reopen { id } => commands::closed::reopen(&runtime, &id).await?,
        },
        Commands::Star { id } => commands::annotate::star(&runtime, &id).await?,
        Commands::MarkWorkspace { id, off } => {
            commands::annotate::mark_workspace(&runtime, &id, !off).await?
        }
        Commands::Note { id, text } => {
            commands::annotate::note(&runtime, &id, text.as_deref()).await?
        }
        Commands::Open { url } => commands::tabs::open(&runtime, &url).await?,
        Commands::Tabs => commands::tabs::list(&runtime).await?,
        Commands::DedupTabs => commands::tidy::dedup_tabs(&runtime).await?,
        Commands::SortTabs => commands::tidy::sort_tabs(&runtime).await?,
        Commands::DedupFolder { id } => commands::tidy::dedup_folder(&runtime, &id).await?,
        Commands::SortFolder { id } => commands::tidy::sort_folder(&runtime, &id).await?,
    }

    runtime.save().await?;
    Ok(())
}
