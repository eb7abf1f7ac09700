//! Classifies raw drop events into engine intents.

use crate::{
    domain::{
        board::{BoardInstanceId, BoardState},
        task::{TaskId, TaskStatus},
    },
    engine::reorder::{reorder_destination_index, Axis, Edge, Intent, TaskRef},
    error::Result,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Data attached to the element being dragged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DragSource {
    #[serde(rename_all = "camelCase")]
    Column {
        column_id: TaskStatus,
        instance_id: BoardInstanceId,
    },
    #[serde(rename_all = "camelCase")]
    Task {
        task_id: TaskId,
        instance_id: BoardInstanceId,
    },
    /// Any payload with a type tag this board does not know
    #[serde(other)]
    Unknown,
}

impl DragSource {
    pub fn instance_id(&self) -> Option<BoardInstanceId> {
        match self {
            DragSource::Column { instance_id, .. } | DragSource::Task { instance_id, .. } => {
                Some(*instance_id)
            }
            DragSource::Unknown => None,
        }
    }
}

/// A region the pointer was over at drop time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DropTarget {
    #[serde(rename_all = "camelCase")]
    Column {
        column_id: TaskStatus,
        #[serde(default)]
        closest_edge: Option<Edge>,
    },
    #[serde(rename_all = "camelCase")]
    Task {
        task_id: TaskId,
        column_id: TaskStatus,
        #[serde(default)]
        closest_edge: Option<Edge>,
    },
}

impl DropTarget {
    pub fn column_id(&self) -> TaskStatus {
        match self {
            DropTarget::Column { column_id, .. } | DropTarget::Task { column_id, .. } => *column_id,
        }
    }

    pub fn closest_edge(&self) -> Option<Edge> {
        match self {
            DropTarget::Column { closest_edge, .. } | DropTarget::Task { closest_edge, .. } => {
                *closest_edge
            }
        }
    }
}

/// A completed drop: what was dragged and where it landed.
///
/// `targets` lists the nested drop targets innermost first, so a drop on a
/// card reports `[card, column]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropEvent {
    pub source: DragSource,
    #[serde(default)]
    pub targets: Vec<DropTarget>,
}

impl DropEvent {
    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// Resolves drops for one board instance
#[derive(Debug, Clone, Copy)]
pub struct DropInterpreter {
    instance_id: BoardInstanceId,
}

impl DropInterpreter {
    pub fn new(instance_id: BoardInstanceId) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> BoardInstanceId {
        self.instance_id
    }

    /// Returns the intent a drop stands for, or `None` if it must be ignored
    pub fn interpret(&self, state: &BoardState, event: &DropEvent) -> Option<Intent> {
        if event.source.instance_id() != Some(self.instance_id) {
            debug!(source = ?event.source, "Ignoring drop from another board");
            return None;
        }
        if event.targets.is_empty() {
            debug!("Ignoring drop outside any target");
            return None;
        }

        match &event.source {
            DragSource::Column { column_id, .. } => {
                Self::resolve_column_drop(state, *column_id, &event.targets)
            }
            DragSource::Task { task_id, .. } => {
                Self::resolve_task_drop(state, task_id, &event.targets)
            }
            DragSource::Unknown => None,
        }
    }

    fn resolve_column_drop(
        state: &BoardState,
        column_id: TaskStatus,
        targets: &[DropTarget],
    ) -> Option<Intent> {
        let target = targets.first()?;
        let start_index = state.column_index(column_id)?;
        let index_of_target = state.column_index(target.column_id())?;

        Some(Intent::ReorderColumn {
            start_index,
            finish_index: reorder_destination_index(
                start_index,
                index_of_target,
                target.closest_edge(),
                Axis::Horizontal,
            ),
        })
    }

    fn resolve_task_drop(
        state: &BoardState,
        task_id: &TaskId,
        targets: &[DropTarget],
    ) -> Option<Intent> {
        let Some((source_column, item_index)) = state.tasks.locate(task_id) else {
            debug!(%task_id, "Dragged task is no longer on the board");
            return None;
        };

        match targets {
            // Dropped on a column, outside any card
            [column] => {
                let destination = column.column_id();
                state.column_index(destination)?;

                if destination == source_column {
                    let last = state.tasks.column_len(source_column).checked_sub(1)?;
                    Some(Intent::ReorderTask {
                        column_id: source_column,
                        start_index: item_index,
                        finish_index: reorder_destination_index(
                            item_index,
                            last,
                            None,
                            Axis::Vertical,
                        ),
                    })
                } else {
                    Some(Intent::MoveTask {
                        task: TaskRef::Index(item_index),
                        from: source_column,
                        to: destination,
                        destination_index: None,
                    })
                }
            }
            // Dropped on a card inside a column
            [DropTarget::Task {
                task_id: target_id,
                closest_edge,
                ..
            }, column] => {
                let destination = column.column_id();
                state.column_index(destination)?;
                let index_of_target = state
                    .tasks
                    .column(destination)
                    .iter()
                    .position(|t| &t.id == target_id)?;

                if destination == source_column {
                    Some(Intent::ReorderTask {
                        column_id: source_column,
                        start_index: item_index,
                        finish_index: reorder_destination_index(
                            item_index,
                            index_of_target,
                            *closest_edge,
                            Axis::Vertical,
                        ),
                    })
                } else {
                    let destination_index = if *closest_edge == Some(Edge::Bottom) {
                        index_of_target + 1
                    } else {
                        index_of_target
                    };
                    Some(Intent::MoveTask {
                        task: TaskRef::Index(item_index),
                        from: source_column,
                        to: destination,
                        destination_index: Some(destination_index),
                    })
                }
            }
            _ => {
                debug!(targets = targets.len(), "Ignoring drop with unexpected target nesting");
                None
            }
        }
    }
}
