use std::cell::Cell;
use std::fs;
use std::rc::Rc;
use taskboard::storage::{load, save, FileStore, Store, StoreError, BOARD_KEY};
use taskboard::{Board, DropEvent, DropTarget, MemoryStore, Workspace, WorkspaceError};

#[test]
fn file_store_round_trips_board() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::new(dir.path());
    let mut board = Board::default();
    let list = board.lists[0].id.clone();
    let task = board.add_task(&list, "ship it").unwrap().unwrap();
    board.toggle_task(&list, &task.id);
    board.add_list(Some("Someday"));

    save(&mut store, &board).unwrap();
    assert!(store.record_path(BOARD_KEY).exists());
    assert_eq!(load(&store), board);
}

#[test]
fn missing_file_loads_default_board() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("nested"));
    let board = load(&store);
    assert_eq!(board.lists.len(), 1);
    assert_eq!(board.lists[0].name, "My list");
}

#[test]
fn corrupt_file_loads_default_board() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    fs::write(store.record_path(BOARD_KEY), "lists: - nope").unwrap();
    let board = load(&store);
    assert_eq!(board.lists.len(), 1);
    assert!(board.lists[0].is_empty());
}

#[test]
fn workspace_reopens_with_saved_state() {
    let dir = tempfile::tempdir().unwrap();
    let (list, task) = {
        let mut ws = Workspace::open(FileStore::new(dir.path()));
        let list = ws.board().lists[0].id.clone();
        let task = ws.add_task(&list, "persist me").unwrap().unwrap();
        (list, task)
    };
    let ws = Workspace::open(FileStore::new(dir.path()));
    assert_eq!(ws.board().task(&list, &task.id), Some(&task));
}

/// Accepts reads; writes succeed only while the shared quota lasts.
struct FlakyStore {
    inner: MemoryStore,
    quota: Rc<Cell<usize>>,
}

impl FlakyStore {
    fn with_quota(quota: usize) -> (Self, Rc<Cell<usize>>) {
        let quota = Rc::new(Cell::new(quota));
        let store = FlakyStore {
            inner: MemoryStore::new(),
            quota: Rc::clone(&quota),
        };
        (store, quota)
    }
}

impl Store for FlakyStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let left = self.quota.get();
        if left == 0 {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "quota exceeded",
            )));
        }
        self.quota.set(left - 1);
        self.inner.write(key, value)
    }
}

#[test]
fn failed_save_keeps_in_memory_change() {
    let (store, _) = FlakyStore::with_quota(1);
    let mut ws = Workspace::open(store);
    let list = ws.board().lists[0].id.clone();
    let first = ws.add_task(&list, "saved").unwrap().unwrap();

    let err = ws.add_task(&list, "unsaved").unwrap_err();
    assert!(matches!(err, WorkspaceError::Persist(_)));
    assert_eq!(ws.board().lists[0].tasks.len(), 2);
    let stored = load(ws.store());
    assert_eq!(stored.lists[0].task_ids(), vec![first.id.clone()]);

    let second = ws.board().lists[0].tasks[1].id.clone();
    ws.drag_start(&list, &first.id);
    let drop_err = ws
        .drop_on(&DropEvent {
            target: DropTarget::ListSpace {
                list_id: list.clone(),
            },
            visual_order: vec![second.clone()],
        })
        .unwrap_err();
    assert!(matches!(drop_err, WorkspaceError::Persist(_)));
    assert!(!ws.drag().is_active());
    assert_eq!(ws.board().lists[0].task_ids(), vec![second, first.id]);
}

#[test]
fn next_successful_save_resyncs_store() {
    let (store, quota) = FlakyStore::with_quota(0);
    let mut ws = Workspace::open(store);
    let list = ws.board().lists[0].id.clone();
    assert!(ws.add_task(&list, "pending").is_err());
    assert!(ws.store().read(BOARD_KEY).unwrap().is_none());

    quota.set(1);
    ws.save().unwrap();
    assert_eq!(&load(ws.store()), ws.board());
    assert_eq!(ws.board().lists[0].tasks.len(), 1);
}
