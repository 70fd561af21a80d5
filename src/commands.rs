use crate::drag::{DropEvent, DropTarget, NoOpReason, Reconciliation};
use crate::logging;
use crate::model::{Board, BoardError, List};
use crate::storage::{init_board, locate_board, BoardLocation, BoardScope, FileStore};
use crate::ui;
use crate::workspace::{Workspace, WorkspaceError};
use anyhow::{anyhow, bail, Result};
use std::env;
use std::path::Path;

/// Where the board lives for this invocation.
pub struct Context {
    pub location: BoardLocation,
}

impl Context {
    /// Resolves an existing board: explicit dir, nearest project, then global.
    pub fn locate(board_dir: Option<&Path>) -> Result<Self> {
        let cwd = env::current_dir()?;
        Ok(Context {
            location: locate_board(board_dir, &cwd)?,
        })
    }

    /// Creates the board first, so the log lands next to it.
    pub fn init(board_dir: Option<&Path>) -> Result<Self> {
        let cwd = env::current_dir()?;
        Ok(Context {
            location: init_board(board_dir, &cwd)?,
        })
    }

    pub fn start_logging(&self, log_level: &str) {
        if let Err(err) = logging::init_logging(log_level, &self.location.dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    fn open(&self) -> Workspace<FileStore> {
        Workspace::open(self.location.store())
    }
}

pub fn init(ctx: &Context) -> Result<()> {
    log::info!(
        "event=board_init module=commands dir={}",
        ctx.location.dir.display()
    );
    println!("Initialized board at {}", ctx.location.dir.display());
    Ok(())
}

pub fn show(ctx: &Context, list: Option<String>) -> Result<()> {
    let ws = ctx.open();
    println!(
        "Board ({})",
        match ctx.location.scope {
            BoardScope::Project => "project",
            BoardScope::Global => "global",
            BoardScope::Explicit => "explicit",
        }
    );
    for l in &ws.board().lists {
        if let Some(ref filter) = list {
            if &l.id != filter {
                continue;
            }
        }
        print_list(l);
        println!();
    }
    Ok(())
}

pub fn add_list(ctx: &Context, name: Option<String>) -> Result<()> {
    let mut ws = ctx.open();
    let list = ws.add_list(name.as_deref())?;
    println!("Added list {} ({})", list.id, list.name);
    Ok(())
}

pub fn rename_list(ctx: &Context, list_id: &str, name: &str) -> Result<()> {
    let mut ws = ctx.open();
    if !ws.rename_list(list_id, name)? {
        bail!("list {} not found", list_id);
    }
    let renamed = ws
        .board()
        .list(list_id)
        .map(|l| l.name.clone())
        .unwrap_or_default();
    println!("Renamed list {} to {}", list_id, renamed);
    Ok(())
}

pub fn delete_list(ctx: &Context, list_id: &str) -> Result<()> {
    let mut ws = ctx.open();
    match ws.delete_list(list_id) {
        Ok(true) => println!("Deleted list {}", list_id),
        Ok(false) => bail!("list {} not found", list_id),
        Err(WorkspaceError::Board(BoardError::LastList)) => {
            bail!("cannot delete {}: a board needs at least one list", list_id)
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

pub fn add(ctx: &Context, list_id: &str, text: &str) -> Result<()> {
    let mut ws = ctx.open();
    match ws.add_task(list_id, text)? {
        Some(task) => println!("Added task {} to {}", task.id, list_id),
        None => bail!("list {} not found", list_id),
    }
    Ok(())
}

pub fn toggle(ctx: &Context, list_id: &str, task_id: &str) -> Result<()> {
    let mut ws = ctx.open();
    if !ws.toggle_task(list_id, task_id)? {
        bail!("task {} not found in list {}", task_id, list_id);
    }
    let done = ws
        .board()
        .task(list_id, task_id)
        .map(|t| t.done)
        .unwrap_or_default();
    println!(
        "Marked {} as {}",
        task_id,
        if done { "done" } else { "open" }
    );
    Ok(())
}

pub fn edit(ctx: &Context, list_id: &str, task_id: &str, text: &str) -> Result<()> {
    let mut ws = ctx.open();
    if !ws.edit_task(list_id, task_id, text)? {
        bail!("task {} not found in list {}", task_id, list_id);
    }
    println!("Updated task {}", task_id);
    Ok(())
}

pub fn delete(ctx: &Context, list_id: &str, task_id: &str) -> Result<()> {
    let mut ws = ctx.open();
    if !ws.delete_task(list_id, task_id)? {
        bail!("task {} not found in list {}", task_id, list_id);
    }
    println!("Deleted task {}", task_id);
    Ok(())
}

/// Runs a move through the same drop path the TUI uses.
pub fn move_task(
    ctx: &Context,
    task_id: &str,
    list_id: &str,
    position: Option<usize>,
) -> Result<()> {
    let mut ws = ctx.open();
    let source_list = source_list_of(ws.board(), task_id)?;
    let event = drop_event_for(ws.board(), task_id, list_id, position)?;
    ws.drag_start(&source_list, task_id);
    match ws.drop_on(&event)? {
        Reconciliation::Reordered { list_id } => println!("Reordered {} in {}", task_id, list_id),
        Reconciliation::Moved { from, to, index } => {
            println!("Moved {} from {} to {} at {}", task_id, from, to, index)
        }
        Reconciliation::Unchanged(NoOpReason::DroppedOnSelf) => {
            println!("{} is already there", task_id)
        }
        Reconciliation::Unchanged(reason) => bail!("move ignored: {:?}", reason),
    }
    Ok(())
}

pub fn tui(ctx: &Context) -> Result<()> {
    ui::run(ctx.open(), &ctx.location)
}

fn source_list_of(board: &Board, task_id: &str) -> Result<String> {
    board
        .locate_task(task_id)
        .map(|(l_idx, _)| board.lists[l_idx].id.clone())
        .ok_or_else(|| anyhow!("task {} not found", task_id))
}

/// Builds the drop a view would report after placing `task_id` at `position`.
fn drop_event_for(
    board: &Board,
    task_id: &str,
    list_id: &str,
    position: Option<usize>,
) -> Result<DropEvent> {
    let target = board
        .list(list_id)
        .ok_or_else(|| anyhow!("list {} not found", list_id))?;
    let mut order: Vec<String> = target
        .task_ids()
        .into_iter()
        .filter(|id| id != task_id)
        .collect();
    let Some(pos) = position else {
        return Ok(DropEvent {
            target: DropTarget::ListSpace {
                list_id: list_id.to_string(),
            },
            visual_order: order,
        });
    };
    let pos = pos.min(order.len());
    order.insert(pos, task_id.to_string());
    let neighbor = order
        .get(pos + 1)
        .or_else(|| pos.checked_sub(1).and_then(|p| order.get(p)))
        .cloned();
    let target = match neighbor {
        Some(task_id) => DropTarget::Task {
            list_id: list_id.to_string(),
            task_id,
        },
        None => DropTarget::ListSpace {
            list_id: list_id.to_string(),
        },
    };
    Ok(DropEvent {
        target,
        visual_order: order,
    })
}

fn print_list(list: &List) {
    println!("{} [{}]", list.name, list.id);
    if list.is_empty() {
        println!("  (empty)");
    }
    for task in &list.tasks {
        println!(
            "  [{}] {}: {}",
            if task.done { "x" } else { " " },
            task.id,
            task.text
        );
    }
}
