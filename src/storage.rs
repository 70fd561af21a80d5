use crate::model::Board;
use directories::ProjectDirs;
use log::{info, warn};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Record key the board is stored under.
pub const BOARD_KEY: &str = "todo_board_v1";
pub const PROJECT_DIR_NAME: &str = ".taskboard";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),
    #[error("serializing board: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Keyed record storage. Each write replaces the whole record.
pub trait Store {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per record inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Store for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.record_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.record_path(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value)?;
        if let Err(err) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }
}

/// Non-durable store, handy for tests and throwaway sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl Store for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads the saved board, or a fresh one if nothing usable is stored.
pub fn load(store: &dyn Store) -> Board {
    let raw = match store.read(BOARD_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            info!("event=board_load module=storage status=absent");
            return Board::default();
        }
        Err(err) => {
            warn!("event=board_load module=storage status=read_failed error={err}");
            return Board::default();
        }
    };
    match serde_json::from_str::<Board>(&raw) {
        Ok(board) if board.is_well_formed() => {
            info!(
                "event=board_load module=storage status=ok lists={} tasks={}",
                board.lists.len(),
                board.task_count()
            );
            board
        }
        Ok(_) => {
            warn!("event=board_load module=storage status=malformed");
            Board::default()
        }
        Err(err) => {
            warn!("event=board_load module=storage status=parse_failed error={err}");
            Board::default()
        }
    }
}

/// Replaces the stored record with the full board.
pub fn save(store: &mut dyn Store, board: &Board) -> Result<(), StoreError> {
    let serialized = serde_json::to_string_pretty(board)?;
    store.write(BOARD_KEY, &serialized)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardScope {
    Project,
    Global,
    Explicit,
}

#[derive(Debug, Clone)]
pub struct BoardLocation {
    pub dir: PathBuf,
    pub scope: BoardScope,
}

impl BoardLocation {
    pub fn store(&self) -> FileStore {
        FileStore::new(&self.dir)
    }
}

/// Seeds an empty board in the explicit directory, or in `.taskboard/` under
/// `cwd`. An existing board is kept.
pub fn init_board(explicit: Option<&Path>, cwd: &Path) -> anyhow::Result<BoardLocation> {
    let location = match explicit {
        Some(dir) => BoardLocation {
            dir: dir.to_path_buf(),
            scope: BoardScope::Explicit,
        },
        None => BoardLocation {
            dir: cwd.join(PROJECT_DIR_NAME),
            scope: BoardScope::Project,
        },
    };
    let mut store = location.store();
    if store.read(BOARD_KEY)?.is_none() {
        save(&mut store, &Board::default())?;
    }
    Ok(location)
}

/// Explicit directory first, then the nearest project board, then the global one.
pub fn locate_board(explicit: Option<&Path>, start: &Path) -> anyhow::Result<BoardLocation> {
    if let Some(dir) = explicit {
        return Ok(BoardLocation {
            dir: dir.to_path_buf(),
            scope: BoardScope::Explicit,
        });
    }
    if let Some(dir) = find_project_board(start) {
        return Ok(BoardLocation {
            dir,
            scope: BoardScope::Project,
        });
    }
    Ok(BoardLocation {
        dir: global_board_dir()?,
        scope: BoardScope::Global,
    })
}

fn find_project_board(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}

fn global_board_dir() -> anyhow::Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "taskboard")
        .ok_or_else(|| anyhow::anyhow!("locating data directory"))?;
    Ok(dirs.data_dir().to_path_buf())
}
