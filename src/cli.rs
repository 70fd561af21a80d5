use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "taskboard", version, about = "Personal kanban board of ordered task lists")]
pub struct Cli {
    /// Board directory (overrides project/global discovery)
    #[arg(long, global = true, env = "TASKBOARD_DIR")]
    pub board_dir: Option<PathBuf>,
    /// Log level written to the board's log file
    #[arg(long, global = true, env = "TASKBOARD_LOG", default_value = crate::logging::DEFAULT_LOG_LEVEL)]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a project board in the current directory
    Init,
    /// Print lists and their tasks
    Show {
        /// Only show this list id
        #[arg(long)]
        list: Option<String>,
    },
    /// Append a new list
    AddList {
        /// List name (defaults to "New list")
        name: Option<String>,
    },
    /// Rename a list
    RenameList {
        list_id: String,
        name: String,
    },
    /// Delete a list and all of its tasks
    DeleteList {
        list_id: String,
    },
    /// Add a task to the end of a list
    Add {
        list_id: String,
        text: String,
    },
    /// Flip a task between open and done
    Toggle {
        list_id: String,
        task_id: String,
    },
    /// Replace a task's text
    Edit {
        list_id: String,
        task_id: String,
        text: String,
    },
    /// Delete a task
    Delete {
        list_id: String,
        task_id: String,
    },
    /// Move a task within or across lists
    Move {
        /// Task id to move
        task_id: String,
        /// Destination list id
        list_id: String,
        /// Zero-based position in the destination (defaults to the end)
        #[arg(long)]
        position: Option<usize>,
    },
    /// Launch the interactive TUI
    Tui,
}
