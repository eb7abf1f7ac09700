use crate::{
    domain::{
        store::TaskStore,
        task::{Task, TaskStatus},
    },
    error::{BoardError, Result},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt};
use uuid::Uuid;

/// Identity that scopes every backend call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-board token carried by drag payloads.
///
/// Drops coming from another board on the same page carry a different id
/// and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardInstanceId(Uuid);

impl BoardInstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BoardInstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BoardInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Board configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub name: String,
    /// Initial left-to-right column order
    pub columns: Vec<TaskStatus>,
    /// Stand-in for a signed-in user
    pub current_user: UserId,
}

impl BoardConfig {
    const DEFAULT_USER: &'static str = "66a94718554eb6b540cd4f69";

    /// Checks that the column list names every status exactly once
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for status in &self.columns {
            if !seen.insert(*status) {
                return Err(BoardError::ConfigError(format!(
                    "Column {} is listed more than once",
                    status.as_str()
                )));
            }
        }
        if let Some(missing) = TaskStatus::ALL.iter().find(|s| !seen.contains(*s)) {
            return Err(BoardError::ConfigError(format!(
                "Column {} is missing",
                missing.as_str()
            )));
        }
        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            name: "Task Board".to_string(),
            columns: TaskStatus::ALL.to_vec(),
            current_user: UserId::new(Self::DEFAULT_USER),
        }
    }
}

/// Input modality that initiated an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Pointer,
    /// Keyboard or programmatic
    Keyboard,
}

/// What the last committed operation changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Outcome {
    #[serde(rename_all = "camelCase")]
    ColumnReorder {
        column_id: TaskStatus,
        start_index: usize,
        finish_index: usize,
    },
    #[serde(rename_all = "camelCase")]
    TaskReorder {
        column_id: TaskStatus,
        start_index: usize,
        finish_index: usize,
    },
    #[serde(rename_all = "camelCase")]
    TaskMove {
        start_column_id: TaskStatus,
        finish_column_id: TaskStatus,
        index_in_start_column: usize,
        index_in_finish_column: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub trigger: Trigger,
    pub outcome: Outcome,
}

/// Everything the board renders from
#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    pub tasks: TaskStore,
    pub ordered_column_ids: Vec<TaskStatus>,
    pub last_operation: Option<Operation>,
}

impl BoardState {
    pub fn new(tasks: TaskStore, ordered_column_ids: Vec<TaskStatus>) -> Self {
        Self {
            tasks,
            ordered_column_ids,
            last_operation: None,
        }
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self::new(TaskStore::new(), config.columns.clone())
    }

    /// Position of a column in the current left-to-right order
    pub fn column_index(&self, column: TaskStatus) -> Option<usize> {
        self.ordered_column_ids.iter().position(|c| *c == column)
    }

    /// Derived task list for one column
    pub fn column_tasks(&self, column: TaskStatus) -> Vec<&Task> {
        self.tasks.column(column)
    }

    /// Columns in display order, each with its derived task list
    pub fn columns(&self) -> Vec<(TaskStatus, Vec<&Task>)> {
        self.ordered_column_ids
            .iter()
            .map(|column| (*column, self.tasks.column(*column)))
            .collect()
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::from_config(&BoardConfig::default())
    }
}
