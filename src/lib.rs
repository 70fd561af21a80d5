//! Personal kanban board: ordered lists of tasks, a drag-and-drop
//! reconciliation engine and a JSON mirror rewritten after every change.

pub mod cli;
pub mod commands;
pub mod drag;
pub mod id;
pub mod logging;
pub mod model;
pub mod storage;
pub mod ui;
pub mod workspace;

pub use drag::{
    reconcile, DragContext, DragSession, DropEvent, DropTarget, NoOpReason, Reconciliation,
};
pub use model::{Board, BoardError, List, Task};
pub use storage::{load, save, FileStore, MemoryStore, Store, StoreError};
pub use workspace::{Workspace, WorkspaceError};
