//! Drag-and-drop reconciliation.
//!
//! The view reorders its own cards while a gesture is in flight. When the
//! gesture ends it reports the target list and the order in which that list's
//! cards are now displayed; this module rewrites the board to match, once.
//!
//! # Invariants
//! - A gesture's context is consumed by the drop (or the cancel) that ends it.
//! - A cross-list move removes before it inserts, so a task id is never held by
//!   two lists.
//! - Lookup misses reconcile to `Unchanged`, never to an error.

use crate::model::{Board, ListId, Task, TaskId};
use log::debug;
use std::collections::HashMap;

/// Where a gesture started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragContext {
    pub source_list_id: ListId,
    pub source_task_id: TaskId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Released over another card.
    Task { list_id: ListId, task_id: TaskId },
    /// Released over a list but not over any card.
    ListSpace { list_id: ListId },
}

impl DropTarget {
    pub fn list_id(&self) -> &str {
        match self {
            DropTarget::Task { list_id, .. } | DropTarget::ListSpace { list_id } => list_id,
        }
    }
}

/// What the view reports when a gesture ends over a valid target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropEvent {
    pub target: DropTarget,
    /// Task ids of the target list, in the order the view currently shows them.
    pub visual_order: Vec<TaskId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    NoActiveDrag,
    DroppedOnSelf,
    MissingList,
    MissingTask,
    NotInVisualOrder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    Reordered {
        list_id: ListId,
    },
    Moved {
        from: ListId,
        to: ListId,
        index: usize,
    },
    Unchanged(NoOpReason),
}

impl Reconciliation {
    pub fn changed(&self) -> bool {
        !matches!(self, Reconciliation::Unchanged(_))
    }

    /// Lists whose task counts the view should re-check for its empty state.
    pub fn affected_lists(&self) -> Vec<&str> {
        match self {
            Reconciliation::Reordered { list_id } => vec![list_id],
            Reconciliation::Moved { from, to, .. } => vec![from, to],
            Reconciliation::Unchanged(_) => Vec::new(),
        }
    }
}

/// Gesture state owned by one interactive session.
#[derive(Debug, Default)]
pub struct DragSession {
    context: Option<DragContext>,
}

impl DragSession {
    pub fn new() -> Self {
        DragSession::default()
    }

    /// Begins a gesture. A context left over from an unfinished gesture is discarded.
    pub fn start(&mut self, list_id: impl Into<ListId>, task_id: impl Into<TaskId>) {
        let ctx = DragContext {
            source_list_id: list_id.into(),
            source_task_id: task_id.into(),
        };
        if let Some(stale) = self.context.replace(ctx) {
            debug!(
                "event=drag_superseded module=drag task={}",
                stale.source_task_id
            );
        }
    }

    pub fn context(&self) -> Option<&DragContext> {
        self.context.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.context.is_some()
    }

    /// Ends the gesture without a drop.
    pub fn cancel(&mut self) -> Option<DragContext> {
        self.context.take()
    }

    /// Ends the gesture with a drop and reconciles the board to the observed order.
    pub fn drop_on(&mut self, board: &mut Board, drop: &DropEvent) -> Reconciliation {
        match self.context.take() {
            Some(ctx) => reconcile(board, &ctx, drop),
            None => Reconciliation::Unchanged(NoOpReason::NoActiveDrag),
        }
    }
}

/// Rewrites the board so the dragged task sits where the view shows it.
pub fn reconcile(board: &mut Board, ctx: &DragContext, drop: &DropEvent) -> Reconciliation {
    let outcome = reconcile_inner(board, ctx, drop);
    debug!(
        "event=drop_reconciled module=drag task={} target_list={} outcome={:?}",
        ctx.source_task_id,
        drop.target.list_id(),
        outcome
    );
    outcome
}

fn reconcile_inner(board: &mut Board, ctx: &DragContext, drop: &DropEvent) -> Reconciliation {
    let dragged = ctx.source_task_id.as_str();
    if let DropTarget::Task { task_id, .. } = &drop.target {
        if task_id == dragged {
            return Reconciliation::Unchanged(NoOpReason::DroppedOnSelf);
        }
    }

    let (Some(src_idx), Some(dst_idx)) = (
        board.list_index(&ctx.source_list_id),
        board.list_index(drop.target.list_id()),
    ) else {
        return Reconciliation::Unchanged(NoOpReason::MissingList);
    };
    let Some(task_pos) = board.lists[src_idx]
        .tasks
        .iter()
        .position(|t| t.id == dragged)
    else {
        return Reconciliation::Unchanged(NoOpReason::MissingTask);
    };

    let mut order = drop.visual_order.clone();
    if !order.iter().any(|id| id == dragged) {
        match drop.target {
            DropTarget::ListSpace { .. } => order.push(dragged.to_string()),
            DropTarget::Task { .. } => {
                return Reconciliation::Unchanged(NoOpReason::NotInVisualOrder)
            }
        }
    }

    if src_idx == dst_idx {
        sort_by_observed(&mut board.lists[dst_idx].tasks, &order);
        return Reconciliation::Reordered {
            list_id: board.lists[dst_idx].id.clone(),
        };
    }

    let task = board.lists[src_idx].tasks.remove(task_pos);
    let target = &mut board.lists[dst_idx];
    let index = insertion_index(&target.tasks, &order, dragged);
    target.tasks.insert(index, task);
    Reconciliation::Moved {
        from: board.lists[src_idx].id.clone(),
        to: board.lists[dst_idx].id.clone(),
        index,
    }
}

/// Stable sort by first position in `order`; unlisted tasks keep their relative
/// order after the listed ones.
fn sort_by_observed(tasks: &mut [Task], order: &[TaskId]) {
    let mut rank: HashMap<&str, usize> = HashMap::with_capacity(order.len());
    for (pos, id) in order.iter().enumerate() {
        rank.entry(id.as_str()).or_insert(pos);
    }
    tasks.sort_by_key(|t| rank.get(t.id.as_str()).copied().unwrap_or(usize::MAX));
}

/// Number of the target's own tasks shown ahead of the dragged one.
fn insertion_index(tasks: &[Task], order: &[TaskId], dragged: &str) -> usize {
    order
        .iter()
        .take_while(|id| id.as_str() != dragged)
        .filter(|id| tasks.iter().any(|t| &t.id == *id))
        .count()
        .min(tasks.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        Task {
            id: id.into(),
            text: id.to_uppercase(),
            done: false,
        }
    }

    fn board(lists: &[(&str, &[&str])]) -> Board {
        Board {
            lists: lists
                .iter()
                .map(|(id, tasks)| crate::model::List {
                    id: (*id).into(),
                    name: id.to_uppercase(),
                    tasks: tasks.iter().map(|t| task(t)).collect(),
                })
                .collect(),
        }
    }

    fn ids(board: &Board, list: &str) -> Vec<String> {
        board.list(list).map(|l| l.task_ids()).unwrap_or_default()
    }

    fn order(ids: &[&str]) -> Vec<TaskId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn neighbor_drop_reorders_within_list() {
        let mut b = board(&[("l1", &["t1", "t2", "t3"])]);
        let mut session = DragSession::new();
        session.start("l1", "t3");
        let result = session.drop_on(
            &mut b,
            &DropEvent {
                target: DropTarget::Task {
                    list_id: "l1".into(),
                    task_id: "t1".into(),
                },
                visual_order: order(&["t3", "t1", "t2"]),
            },
        );
        assert_eq!(
            result,
            Reconciliation::Reordered {
                list_id: "l1".into()
            }
        );
        assert_eq!(ids(&b, "l1"), order(&["t3", "t1", "t2"]));
        assert!(!session.is_active());
    }

    #[test]
    fn empty_space_drop_moves_to_end_of_other_list() {
        let mut b = board(&[("l1", &["t1"]), ("l2", &[])]);
        let mut session = DragSession::new();
        session.start("l1", "t1");
        let result = session.drop_on(
            &mut b,
            &DropEvent {
                target: DropTarget::ListSpace {
                    list_id: "l2".into(),
                },
                visual_order: Vec::new(),
            },
        );
        assert_eq!(
            result,
            Reconciliation::Moved {
                from: "l1".into(),
                to: "l2".into(),
                index: 0
            }
        );
        assert!(ids(&b, "l1").is_empty());
        assert_eq!(ids(&b, "l2"), order(&["t1"]));
        assert_eq!(result.affected_lists(), vec!["l1", "l2"]);
    }

    #[test]
    fn cross_list_drop_inserts_at_observed_position() {
        let mut b = board(&[("l1", &["t1", "t2"]), ("l2", &["a", "b", "c"])]);
        let ctx = DragContext {
            source_list_id: "l1".into(),
            source_task_id: "t2".into(),
        };
        let drop = DropEvent {
            target: DropTarget::Task {
                list_id: "l2".into(),
                task_id: "c".into(),
            },
            visual_order: order(&["a", "b", "t2", "c"]),
        };
        let result = reconcile(&mut b, &ctx, &drop);
        assert_eq!(
            result,
            Reconciliation::Moved {
                from: "l1".into(),
                to: "l2".into(),
                index: 2
            }
        );
        assert_eq!(ids(&b, "l1"), order(&["t1"]));
        assert_eq!(ids(&b, "l2"), order(&["a", "b", "t2", "c"]));
    }

    #[test]
    fn empty_space_drop_keeps_view_placement_when_present() {
        let mut b = board(&[("l1", &["t1"]), ("l2", &["a", "b"])]);
        let ctx = DragContext {
            source_list_id: "l1".into(),
            source_task_id: "t1".into(),
        };
        let drop = DropEvent {
            target: DropTarget::ListSpace {
                list_id: "l2".into(),
            },
            visual_order: order(&["t1", "a", "b"]),
        };
        reconcile(&mut b, &ctx, &drop);
        assert_eq!(ids(&b, "l2"), order(&["t1", "a", "b"]));
    }

    #[test]
    fn empty_space_drop_in_same_list_sends_task_last() {
        let mut b = board(&[("l1", &["t1", "t2", "t3"])]);
        let ctx = DragContext {
            source_list_id: "l1".into(),
            source_task_id: "t1".into(),
        };
        let drop = DropEvent {
            target: DropTarget::ListSpace {
                list_id: "l1".into(),
            },
            visual_order: order(&["t2", "t3"]),
        };
        reconcile(&mut b, &ctx, &drop);
        assert_eq!(ids(&b, "l1"), order(&["t2", "t3", "t1"]));
    }

    #[test]
    fn drop_on_self_is_noop() {
        let mut b = board(&[("l1", &["t1", "t2"])]);
        let before = b.clone();
        let mut session = DragSession::new();
        session.start("l1", "t1");
        let result = session.drop_on(
            &mut b,
            &DropEvent {
                target: DropTarget::Task {
                    list_id: "l1".into(),
                    task_id: "t1".into(),
                },
                visual_order: order(&["t2", "t1"]),
            },
        );
        assert_eq!(result, Reconciliation::Unchanged(NoOpReason::DroppedOnSelf));
        assert_eq!(b, before);
        assert!(!session.is_active());
    }

    #[test]
    fn drop_without_gesture_is_noop() {
        let mut b = board(&[("l1", &["t1", "t2"])]);
        let before = b.clone();
        let mut session = DragSession::new();
        let result = session.drop_on(
            &mut b,
            &DropEvent {
                target: DropTarget::ListSpace {
                    list_id: "l1".into(),
                },
                visual_order: order(&["t2", "t1"]),
            },
        );
        assert_eq!(result, Reconciliation::Unchanged(NoOpReason::NoActiveDrag));
        assert!(!result.changed());
        assert_eq!(b, before);
    }

    #[test]
    fn cancel_clears_context_so_next_drop_is_noop() {
        let mut b = board(&[("l1", &["t1", "t2"])]);
        let mut session = DragSession::new();
        session.start("l1", "t2");
        assert_eq!(
            session.cancel().map(|c| c.source_task_id),
            Some("t2".to_string())
        );
        let result = session.drop_on(
            &mut b,
            &DropEvent {
                target: DropTarget::ListSpace {
                    list_id: "l1".into(),
                },
                visual_order: order(&["t2", "t1"]),
            },
        );
        assert_eq!(result, Reconciliation::Unchanged(NoOpReason::NoActiveDrag));
        assert_eq!(ids(&b, "l1"), order(&["t1", "t2"]));
    }

    #[test]
    fn new_start_supersedes_stale_context() {
        let mut session = DragSession::new();
        session.start("l1", "t1");
        session.start("l2", "t9");
        assert_eq!(
            session.context(),
            Some(&DragContext {
                source_list_id: "l2".into(),
                source_task_id: "t9".into(),
            })
        );
    }

    #[test]
    fn deleted_list_mid_gesture_is_noop() {
        let mut b = board(&[("l1", &["t1"]), ("l2", &[])]);
        let ctx = DragContext {
            source_list_id: "l1".into(),
            source_task_id: "t1".into(),
        };
        b.lists.retain(|l| l.id != "l2");
        let before = b.clone();
        let drop = DropEvent {
            target: DropTarget::ListSpace {
                list_id: "l2".into(),
            },
            visual_order: order(&["t1"]),
        };
        assert_eq!(
            reconcile(&mut b, &ctx, &drop),
            Reconciliation::Unchanged(NoOpReason::MissingList)
        );
        assert_eq!(b, before);
    }

    #[test]
    fn deleted_task_mid_gesture_is_noop() {
        let mut b = board(&[("l1", &["t2"])]);
        let ctx = DragContext {
            source_list_id: "l1".into(),
            source_task_id: "t1".into(),
        };
        let drop = DropEvent {
            target: DropTarget::ListSpace {
                list_id: "l1".into(),
            },
            visual_order: order(&["t2", "t1"]),
        };
        assert_eq!(
            reconcile(&mut b, &ctx, &drop),
            Reconciliation::Unchanged(NoOpReason::MissingTask)
        );
    }

    #[test]
    fn neighbor_drop_without_dragged_id_is_noop() {
        let mut b = board(&[("l1", &["t1"]), ("l2", &["a"])]);
        let before = b.clone();
        let ctx = DragContext {
            source_list_id: "l1".into(),
            source_task_id: "t1".into(),
        };
        let drop = DropEvent {
            target: DropTarget::Task {
                list_id: "l2".into(),
                task_id: "a".into(),
            },
            visual_order: order(&["a"]),
        };
        assert_eq!(
            reconcile(&mut b, &ctx, &drop),
            Reconciliation::Unchanged(NoOpReason::NotInVisualOrder)
        );
        assert_eq!(b, before);
    }

    #[test]
    fn reorder_ignores_unknown_ids_and_keeps_unlisted_tasks() {
        let mut b = board(&[("l1", &["t1", "t2", "t3", "t4"])]);
        let ctx = DragContext {
            source_list_id: "l1".into(),
            source_task_id: "t3".into(),
        };
        let drop = DropEvent {
            target: DropTarget::Task {
                list_id: "l1".into(),
                task_id: "t1".into(),
            },
            visual_order: order(&["ghost", "t3", "t1"]),
        };
        reconcile(&mut b, &ctx, &drop);
        assert_eq!(ids(&b, "l1"), order(&["t3", "t1", "t2", "t4"]));
    }

    #[test]
    fn reconciling_same_order_twice_is_idempotent() {
        let mut b = board(&[("l1", &["t1", "t2", "t3"])]);
        let ctx = DragContext {
            source_list_id: "l1".into(),
            source_task_id: "t1".into(),
        };
        let drop = DropEvent {
            target: DropTarget::Task {
                list_id: "l1".into(),
                task_id: "t3".into(),
            },
            visual_order: order(&["t2", "t3", "t1"]),
        };
        reconcile(&mut b, &ctx, &drop);
        let once = b.clone();
        reconcile(&mut b, &ctx, &drop);
        assert_eq!(b, once);
    }
}
