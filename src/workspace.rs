use crate::drag::{DragSession, DropEvent, Reconciliation};
use crate::model::{Board, BoardError, List, Task};
use crate::storage::{self, Store, StoreError};
use log::{info, warn};

#[derive(thiserror::Error, Debug)]
pub enum WorkspaceError {
    #[error(transparent)]
    Board(#[from] BoardError),
    /// The in-memory change stands; the next successful save catches up.
    #[error("board changed but could not be saved: {0}")]
    Persist(#[from] StoreError),
}

/// The one authoritative board, its persisted mirror and the in-flight gesture.
///
/// Every operation that changes the board saves it exactly once before
/// returning. Operations that change nothing do not touch the store.
pub struct Workspace<S: Store> {
    board: Board,
    store: S,
    drag: DragSession,
}

impl<S: Store> Workspace<S> {
    pub fn open(store: S) -> Self {
        let board = storage::load(&store);
        Workspace {
            board,
            store,
            drag: DragSession::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    pub fn add_list(&mut self, name: Option<&str>) -> Result<List, WorkspaceError> {
        let list = self.board.add_list(name);
        self.persist("add_list")?;
        Ok(list)
    }

    pub fn rename_list(&mut self, list_id: &str, new_name: &str) -> Result<bool, WorkspaceError> {
        let changed = self.board.rename_list(list_id, new_name);
        self.persist_if(changed, "rename_list")?;
        Ok(changed)
    }

    pub fn delete_list(&mut self, list_id: &str) -> Result<bool, WorkspaceError> {
        let changed = self.board.delete_list(list_id)?;
        self.persist_if(changed, "delete_list")?;
        Ok(changed)
    }

    pub fn add_task(&mut self, list_id: &str, text: &str) -> Result<Option<Task>, WorkspaceError> {
        let task = self.board.add_task(list_id, text)?;
        self.persist_if(task.is_some(), "add_task")?;
        Ok(task)
    }

    pub fn toggle_task(&mut self, list_id: &str, task_id: &str) -> Result<bool, WorkspaceError> {
        let changed = self.board.toggle_task(list_id, task_id);
        self.persist_if(changed, "toggle_task")?;
        Ok(changed)
    }

    pub fn edit_task(
        &mut self,
        list_id: &str,
        task_id: &str,
        new_text: &str,
    ) -> Result<bool, WorkspaceError> {
        let changed = self.board.edit_task(list_id, task_id, new_text)?;
        self.persist_if(changed, "edit_task")?;
        Ok(changed)
    }

    pub fn delete_task(&mut self, list_id: &str, task_id: &str) -> Result<bool, WorkspaceError> {
        let changed = self.board.delete_task(list_id, task_id);
        self.persist_if(changed, "delete_task")?;
        Ok(changed)
    }

    pub fn drag_start(&mut self, list_id: &str, task_id: &str) {
        self.drag.start(list_id, task_id);
    }

    /// Gesture ended without a valid target.
    pub fn drag_cancel(&mut self) {
        self.drag.cancel();
    }

    /// Gesture ended over a target; the drag context is cleared whatever the outcome.
    pub fn drop_on(&mut self, event: &DropEvent) -> Result<Reconciliation, WorkspaceError> {
        let outcome = self.drag.drop_on(&mut self.board, event);
        self.persist_if(outcome.changed(), "drop")?;
        Ok(outcome)
    }

    /// Rewrites the stored board from memory, e.g. after an earlier save failed.
    pub fn save(&mut self) -> Result<(), WorkspaceError> {
        self.persist("resync")
    }

    fn persist_if(&mut self, changed: bool, op: &str) -> Result<(), WorkspaceError> {
        if changed {
            self.persist(op)
        } else {
            Ok(())
        }
    }

    fn persist(&mut self, op: &str) -> Result<(), WorkspaceError> {
        match storage::save(&mut self.store, &self.board) {
            Ok(()) => {
                info!("event=board_saved module=workspace op={op}");
                Ok(())
            }
            Err(err) => {
                warn!("event=board_save_failed module=workspace op={op} error={err}");
                Err(err.into())
            }
        }
    }
}
