use crate::{
    domain::task::{Task, TaskId, TaskStatus},
    error::{BoardError, Result},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Flat, ordered collection of tasks.
///
/// The relative order of same-status tasks is the order of that column;
/// per-column lists are always derived from here and never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a loaded list, dropping repeated ids
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut store = Self::new();
        store.replace_all(tasks);
        store
    }

    /// Appends a task; an id that is already present is rejected
    pub fn add(&mut self, task: Task) -> Result<()> {
        if self.contains(&task.id) {
            return Err(BoardError::DuplicateTask(task.id.to_string()));
        }
        self.tasks.push(task);
        Ok(())
    }

    /// Replaces the task with the same id in place.
    ///
    /// Returns `false` without touching the store when the id is absent.
    pub fn update(&mut self, task: Task) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task;
                true
            }
            None => {
                debug!(task_id = %task.id, "Ignoring update for unknown task");
                false
            }
        }
    }

    /// Removes the task with the given id, returning it if present
    pub fn delete(&mut self, id: &TaskId) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| &t.id == id)?;
        Some(self.tasks.remove(pos))
    }

    /// Overwrites the whole collection, keeping the first of any repeated id
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        let mut seen = HashSet::with_capacity(tasks.len());
        self.tasks = tasks
            .into_iter()
            .filter(|task| {
                let fresh = seen.insert(task.id.clone());
                if !fresh {
                    warn!(task_id = %task.id, "Dropping task with repeated id");
                }
                fresh
            })
            .collect();
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.get(id).is_some()
    }

    /// Derived view of one column, in board order
    pub fn column(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == status).collect()
    }

    /// Number of tasks in one column
    pub fn column_len(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    /// Index of a task within its column view, along with that column
    pub fn locate(&self, id: &TaskId) -> Option<(TaskStatus, usize)> {
        let status = self.get(id)?.status;
        let index = self
            .tasks
            .iter()
            .filter(|t| t.status == status)
            .position(|t| &t.id == id)?;
        Some((status, index))
    }

    /// Task at `index` within a column view
    pub fn task_in_column(&self, status: TaskStatus, index: usize) -> Option<&Task> {
        self.tasks.iter().filter(|t| t.status == status).nth(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }
}

impl<'a> IntoIterator for &'a TaskStore {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, status: TaskStatus) -> Task {
        Task::new(id.parse().unwrap(), format!("Task {}", id)).with_status(status)
    }

    #[test]
    fn test_add_appends_and_rejects_duplicates() {
        let mut store = TaskStore::new();
        store.add(task("a", TaskStatus::Todo)).unwrap();
        store.add(task("b", TaskStatus::Todo)).unwrap();

        let err = store.add(task("a", TaskStatus::Completed)).unwrap_err();
        assert!(matches!(err, BoardError::DuplicateTask(ref id) if id == "a"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&"a".parse().unwrap()).unwrap().status, TaskStatus::Todo);
    }

    #[test]
    fn test_update_replaces_in_place() {
        let mut store = TaskStore::from_tasks(vec![
            task("a", TaskStatus::Todo),
            task("b", TaskStatus::Todo),
        ]);

        let mut changed = task("a", TaskStatus::InProgress);
        changed.set_title("Renamed".to_string());
        assert!(store.update(changed));

        assert_eq!(store.as_slice()[0].title, "Renamed");
        assert_eq!(store.as_slice()[0].status, TaskStatus::InProgress);
        assert_eq!(store.as_slice()[1].id.as_str(), "b");
    }

    #[test]
    fn test_update_unknown_is_silent_noop() {
        let mut store = TaskStore::from_tasks(vec![task("a", TaskStatus::Todo)]);
        let before = store.clone();

        assert!(!store.update(task("zzz", TaskStatus::Completed)));
        assert_eq!(store, before);
    }

    #[test]
    fn test_delete() {
        let mut store = TaskStore::from_tasks(vec![
            task("a", TaskStatus::Todo),
            task("b", TaskStatus::Todo),
        ]);

        let removed = store.delete(&"a".parse().unwrap()).unwrap();
        assert_eq!(removed.id.as_str(), "a");
        assert_eq!(store.len(), 1);
        assert!(store.delete(&"a".parse().unwrap()).is_none());
    }

    #[test]
    fn test_replace_all_keeps_first_of_repeated_ids() {
        let mut store = TaskStore::from_tasks(vec![task("old", TaskStatus::Todo)]);
        store.replace_all(vec![
            task("a", TaskStatus::Todo),
            task("b", TaskStatus::Completed),
            task("a", TaskStatus::Completed),
        ]);

        let ids: Vec<_> = store.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.as_slice()[0].status, TaskStatus::Todo);
    }

    #[test]
    fn test_column_views_are_derived() {
        let store = TaskStore::from_tasks(vec![
            task("a", TaskStatus::Todo),
            task("b", TaskStatus::Completed),
            task("c", TaskStatus::Todo),
        ]);

        let todo: Vec<_> = store
            .column(TaskStatus::Todo)
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(todo, vec!["a", "c"]);
        assert_eq!(store.column_len(TaskStatus::InProgress), 0);

        assert_eq!(store.locate(&"c".parse().unwrap()), Some((TaskStatus::Todo, 1)));
        assert_eq!(
            store.task_in_column(TaskStatus::Completed, 0).map(|t| t.id.as_str()),
            Some("b")
        );
        assert!(store.task_in_column(TaskStatus::Completed, 1).is_none());
    }
}
