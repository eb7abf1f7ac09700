//! Pure list algorithms behind every board mutation.
//!
//! Each transition takes the current [`BoardState`] by reference and returns
//! the next state with `last_operation` recorded, or `None` when the request
//! does not apply (unknown task, out-of-range index, same-column move).

use crate::domain::{
    board::{BoardState, Operation, Outcome, Trigger},
    store::TaskStore,
    task::{Task, TaskId, TaskStatus},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Side of a drop target the pointer was nearest to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

/// Direction along which a list is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Edge {
    /// Whether dropping on this edge means "insert after the target"
    pub fn is_trailing(self, axis: Axis) -> bool {
        matches!(
            (axis, self),
            (Axis::Vertical, Edge::Bottom) | (Axis::Horizontal, Edge::Right)
        )
    }
}

/// A task addressed either by id or by its index in the source column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRef {
    Id(TaskId),
    Index(usize),
}

impl From<TaskId> for TaskRef {
    fn from(id: TaskId) -> Self {
        TaskRef::Id(id)
    }
}

impl From<usize> for TaskRef {
    fn from(index: usize) -> Self {
        TaskRef::Index(index)
    }
}

/// A resolved mutation request, ready for the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    ReorderColumn {
        start_index: usize,
        finish_index: usize,
    },
    ReorderTask {
        column_id: TaskStatus,
        start_index: usize,
        finish_index: usize,
    },
    MoveTask {
        task: TaskRef,
        from: TaskStatus,
        to: TaskStatus,
        /// End of the destination column when absent
        destination_index: Option<usize>,
    },
}

/// Moves the element at `start` so it ends up at `finish`.
///
/// This is a relocation, not a swap: elements between the two indices shift
/// by one. Both indices must be in range.
pub fn reorder<T: Clone>(list: &[T], start: usize, finish: usize) -> Option<Vec<T>> {
    if start >= list.len() || finish >= list.len() {
        return None;
    }
    let mut result = list.to_vec();
    let item = result.remove(start);
    result.insert(finish, item);
    Some(result)
}

/// Turns "dropped on `index_of_target` near `closest_edge`" into the finish
/// index for [`reorder`], accounting for the gap left by the dragged item.
pub fn reorder_destination_index(
    start_index: usize,
    index_of_target: usize,
    closest_edge: Option<Edge>,
    axis: Axis,
) -> usize {
    if start_index == index_of_target {
        return start_index;
    }
    let Some(edge) = closest_edge else {
        return index_of_target;
    };
    let after = edge.is_trailing(axis);
    if start_index < index_of_target {
        if after {
            index_of_target
        } else {
            index_of_target - 1
        }
    } else if after {
        index_of_target + 1
    } else {
        index_of_target
    }
}

/// Relocates a task inside one column.
///
/// Indices are relative to the column view. The column's tasks are written
/// back into the flat slots they already occupied, so tasks of other columns
/// keep their positions.
pub fn reorder_within_column(
    state: &BoardState,
    column_id: TaskStatus,
    start_index: usize,
    finish_index: usize,
    trigger: Trigger,
) -> Option<BoardState> {
    let column: Vec<Task> = state.tasks.column(column_id).into_iter().cloned().collect();
    let Some(reordered) = reorder(&column, start_index, finish_index) else {
        debug!(
            column = column_id.as_str(),
            start_index,
            finish_index,
            len = column.len(),
            "Task reorder out of range"
        );
        return None;
    };

    let mut replacements = reordered.into_iter();
    let tasks: Vec<Task> = state
        .tasks
        .iter()
        .map(|task| {
            if task.status == column_id {
                replacements.next().unwrap_or_else(|| task.clone())
            } else {
                task.clone()
            }
        })
        .collect();

    Some(BoardState {
        tasks: TaskStore::from_tasks(tasks),
        ordered_column_ids: state.ordered_column_ids.clone(),
        last_operation: Some(Operation {
            trigger,
            outcome: Outcome::TaskReorder {
                column_id,
                start_index,
                finish_index,
            },
        }),
    })
}

/// Moves a task to another column, changing its status.
///
/// The task lands at `destination_index` in the destination column view, or
/// at its end when no index is given.
pub fn move_across_columns(
    state: &BoardState,
    task: impl Into<TaskRef>,
    from: TaskStatus,
    to: TaskStatus,
    destination_index: Option<usize>,
    trigger: Trigger,
) -> Option<BoardState> {
    if from == to {
        return None;
    }

    let start_index = match task.into() {
        TaskRef::Index(index) => index,
        TaskRef::Id(id) => match state.tasks.locate(&id) {
            Some((status, index)) if status == from => index,
            _ => {
                debug!(
                    task_id = %id,
                    from = from.as_str(),
                    "Task to move is not in the source column"
                );
                return None;
            }
        },
    };
    let Some(moving) = state.tasks.task_in_column(from, start_index) else {
        debug!(column = from.as_str(), start_index, "No task at source index");
        return None;
    };
    let mut moving = moving.clone();

    let mut remaining: Vec<Task> = state
        .tasks
        .iter()
        .filter(|t| t.id != moving.id)
        .cloned()
        .collect();
    let destination_slots: Vec<usize> = remaining
        .iter()
        .enumerate()
        .filter(|(_, t)| t.status == to)
        .map(|(pos, _)| pos)
        .collect();

    let index_in_finish_column = destination_index.unwrap_or(destination_slots.len());
    if index_in_finish_column > destination_slots.len() {
        debug!(
            column = to.as_str(),
            index_in_finish_column,
            len = destination_slots.len(),
            "Move destination out of range"
        );
        return None;
    }
    let flat_index = match destination_slots.get(index_in_finish_column) {
        Some(&pos) => pos,
        None => destination_slots
            .last()
            .map_or(remaining.len(), |&pos| pos + 1),
    };

    moving.status = to;
    remaining.insert(flat_index, moving);

    Some(BoardState {
        tasks: TaskStore::from_tasks(remaining),
        ordered_column_ids: state.ordered_column_ids.clone(),
        last_operation: Some(Operation {
            trigger,
            outcome: Outcome::TaskMove {
                start_column_id: from,
                finish_column_id: to,
                index_in_start_column: start_index,
                index_in_finish_column,
            },
        }),
    })
}

/// Relocates a column in the left-to-right order. Task statuses are untouched.
pub fn reorder_columns(
    state: &BoardState,
    start_index: usize,
    finish_index: usize,
    trigger: Trigger,
) -> Option<BoardState> {
    let ordered_column_ids = reorder(&state.ordered_column_ids, start_index, finish_index)?;
    let column_id = state.ordered_column_ids[start_index];

    Some(BoardState {
        tasks: state.tasks.clone(),
        ordered_column_ids,
        last_operation: Some(Operation {
            trigger,
            outcome: Outcome::ColumnReorder {
                column_id,
                start_index,
                finish_index,
            },
        }),
    })
}

/// Runs a resolved intent through the matching transition
pub fn apply(state: &BoardState, intent: &Intent, trigger: Trigger) -> Option<BoardState> {
    match intent {
        Intent::ReorderColumn {
            start_index,
            finish_index,
        } => reorder_columns(state, *start_index, *finish_index, trigger),
        Intent::ReorderTask {
            column_id,
            start_index,
            finish_index,
        } => reorder_within_column(state, *column_id, *start_index, *finish_index, trigger),
        Intent::MoveTask {
            task,
            from,
            to,
            destination_index,
        } => move_across_columns(state, task.clone(), *from, *to, *destination_index, trigger),
    }
}

/// Re-applies a recorded operation to `state`.
///
/// Replaying an operation against the state it was produced from yields the
/// same resulting state.
pub fn replay(state: &BoardState, operation: &Operation) -> Option<BoardState> {
    let intent = match &operation.outcome {
        Outcome::ColumnReorder {
            start_index,
            finish_index,
            ..
        } => Intent::ReorderColumn {
            start_index: *start_index,
            finish_index: *finish_index,
        },
        Outcome::TaskReorder {
            column_id,
            start_index,
            finish_index,
        } => Intent::ReorderTask {
            column_id: *column_id,
            start_index: *start_index,
            finish_index: *finish_index,
        },
        Outcome::TaskMove {
            start_column_id,
            finish_column_id,
            index_in_start_column,
            index_in_finish_column,
        } => Intent::MoveTask {
            task: TaskRef::Index(*index_in_start_column),
            from: *start_column_id,
            to: *finish_column_id,
            destination_index: Some(*index_in_finish_column),
        },
    };
    apply(state, &intent, operation.trigger)
}
