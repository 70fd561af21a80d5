use crate::id::new_id;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type ListId = String;
pub type TaskId = String;

/// Name given to the single list of a fresh board.
pub const DEFAULT_LIST_NAME: &str = "My list";
/// Name of a newly added list, and the fallback when a rename trims to nothing.
pub const NEW_LIST_NAME: &str = "New list";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Board {
    pub lists: Vec<List>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct List {
    pub id: ListId,
    pub name: String,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub done: bool,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("task text cannot be empty")]
    EmptyText,
    #[error("cannot delete the last remaining list")]
    LastList,
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Board {
            lists: vec![List::new(DEFAULT_LIST_NAME)],
        }
    }

    /// At least one list, no list or task id appears twice, no blank list
    /// name and no blank task text.
    pub fn is_well_formed(&self) -> bool {
        if self.lists.is_empty() {
            return false;
        }
        let mut list_ids = HashSet::new();
        let mut task_ids = HashSet::new();
        self.lists.iter().all(|list| {
            !list.name.trim().is_empty()
                && list_ids.insert(list.id.as_str())
                && list.tasks.iter().all(|t| {
                    !t.text.trim().is_empty() && task_ids.insert(t.id.as_str())
                })
        })
    }

    pub fn list_index(&self, id: &str) -> Option<usize> {
        self.lists.iter().position(|l| l.id == id)
    }

    pub fn list(&self, id: &str) -> Option<&List> {
        self.lists.iter().find(|l| l.id == id)
    }

    fn list_mut(&mut self, id: &str) -> Option<&mut List> {
        self.lists.iter_mut().find(|l| l.id == id)
    }

    pub fn task(&self, list_id: &str, task_id: &str) -> Option<&Task> {
        self.list(list_id)?.tasks.iter().find(|t| t.id == task_id)
    }

    fn task_mut(&mut self, list_id: &str, task_id: &str) -> Option<&mut Task> {
        self.list_mut(list_id)?
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
    }

    /// Position of a task as `(list index, task index)`.
    pub fn locate_task(&self, task_id: &str) -> Option<(usize, usize)> {
        self.lists.iter().enumerate().find_map(|(l_idx, list)| {
            list.tasks
                .iter()
                .position(|t| t.id == task_id)
                .map(|t_idx| (l_idx, t_idx))
        })
    }

    pub fn task_count(&self) -> usize {
        self.lists.iter().map(|l| l.tasks.len()).sum()
    }

    pub fn add_list(&mut self, name: Option<&str>) -> List {
        let list = List::new(name.unwrap_or(NEW_LIST_NAME));
        self.lists.push(list.clone());
        list
    }

    /// Returns `false` when the list is unknown.
    pub fn rename_list(&mut self, list_id: &str, new_name: &str) -> bool {
        let Some(list) = self.list_mut(list_id) else {
            return false;
        };
        let trimmed = new_name.trim();
        list.name = if trimmed.is_empty() {
            NEW_LIST_NAME.to_string()
        } else {
            trimmed.to_string()
        };
        true
    }

    /// Removes the list and every task in it. `Ok(false)` means the id was unknown.
    pub fn delete_list(&mut self, list_id: &str) -> Result<bool, BoardError> {
        if self.lists.len() == 1 {
            return Err(BoardError::LastList);
        }
        match self.list_index(list_id) {
            Some(idx) => {
                self.lists.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Appends a task to the list. `Ok(None)` means the list was unknown.
    pub fn add_task(&mut self, list_id: &str, text: &str) -> Result<Option<Task>, BoardError> {
        let text = non_empty(text)?;
        let Some(list) = self.list_mut(list_id) else {
            return Ok(None);
        };
        let task = Task {
            id: new_id(),
            text,
            done: false,
        };
        list.tasks.push(task.clone());
        Ok(Some(task))
    }

    pub fn toggle_task(&mut self, list_id: &str, task_id: &str) -> bool {
        match self.task_mut(list_id, task_id) {
            Some(task) => {
                task.done = !task.done;
                true
            }
            None => false,
        }
    }

    /// On `EmptyText` the old text is kept.
    pub fn edit_task(
        &mut self,
        list_id: &str,
        task_id: &str,
        new_text: &str,
    ) -> Result<bool, BoardError> {
        let text = non_empty(new_text)?;
        match self.task_mut(list_id, task_id) {
            Some(task) => {
                task.text = text;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn delete_task(&mut self, list_id: &str, task_id: &str) -> bool {
        let Some(list) = self.list_mut(list_id) else {
            return false;
        };
        let before = list.tasks.len();
        list.tasks.retain(|t| t.id != task_id);
        list.tasks.len() != before
    }
}

impl List {
    pub fn new(name: impl Into<String>) -> Self {
        List {
            id: new_id(),
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.id.clone()).collect()
    }
}

fn non_empty(text: &str) -> Result<String, BoardError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(BoardError::EmptyText);
    }
    Ok(trimmed.to_string())
}
