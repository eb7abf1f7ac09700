//! Side table from task and column ids to their live UI handles.
//!
//! Entries exist only while the element is mounted: registering returns a
//! [`Registration`] that removes the entry when it is disposed or dropped.

use crate::domain::task::{TaskId, TaskStatus};
use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
};

/// A mounted UI element the board can give feedback on
pub trait ElementHandle {
    /// Briefly highlights the element after it moved
    fn flash(&self);

    /// Moves keyboard focus to the element
    fn focus(&self) {}
}

#[derive(Clone)]
pub struct TaskEntry {
    pub element: Rc<dyn ElementHandle>,
    /// Control that receives focus after a keyboard move
    pub action_menu_trigger: Rc<dyn ElementHandle>,
}

#[derive(Clone)]
pub struct ColumnEntry {
    pub element: Rc<dyn ElementHandle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Task(TaskId),
    Column(TaskStatus),
}

#[derive(Default)]
struct Entries {
    tasks: HashMap<TaskId, (u64, TaskEntry)>,
    columns: HashMap<TaskStatus, (u64, ColumnEntry)>,
    next_generation: u64,
}

impl Entries {
    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    fn remove(&mut self, key: &Key, generation: u64) {
        // A remount may have replaced the entry; only remove our own
        match key {
            Key::Task(id) => {
                if self.tasks.get(id).is_some_and(|(g, _)| *g == generation) {
                    self.tasks.remove(id);
                }
            }
            Key::Column(id) => {
                if self.columns.get(id).is_some_and(|(g, _)| *g == generation) {
                    self.columns.remove(id);
                }
            }
        }
    }
}

/// Shared handle to the board's registry; clones see the same entries
#[derive(Clone, Default)]
pub struct Registry {
    entries: Rc<RefCell<Entries>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_task(&self, task_id: TaskId, entry: TaskEntry) -> Registration {
        let mut entries = self.entries.borrow_mut();
        let generation = entries.bump();
        entries.tasks.insert(task_id.clone(), (generation, entry));
        Registration::new(&self.entries, Key::Task(task_id), generation)
    }

    pub fn register_column(&self, column_id: TaskStatus, entry: ColumnEntry) -> Registration {
        let mut entries = self.entries.borrow_mut();
        let generation = entries.bump();
        entries.columns.insert(column_id, (generation, entry));
        Registration::new(&self.entries, Key::Column(column_id), generation)
    }

    pub fn task(&self, task_id: &TaskId) -> Option<TaskEntry> {
        self.entries
            .borrow()
            .tasks
            .get(task_id)
            .map(|(_, entry)| entry.clone())
    }

    pub fn column(&self, column_id: TaskStatus) -> Option<ColumnEntry> {
        self.entries
            .borrow()
            .columns
            .get(&column_id)
            .map(|(_, entry)| entry.clone())
    }

    pub fn task_count(&self) -> usize {
        self.entries.borrow().tasks.len()
    }

    pub fn column_count(&self) -> usize {
        self.entries.borrow().columns.len()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("tasks", &self.task_count())
            .field("columns", &self.column_count())
            .finish()
    }
}

/// Disposer for one registry entry; unregisters on [`dispose`](Self::dispose) or drop
#[must_use = "dropping the registration unregisters the entry immediately"]
pub struct Registration {
    entries: Weak<RefCell<Entries>>,
    key: Key,
    generation: u64,
}

impl Registration {
    fn new(entries: &Rc<RefCell<Entries>>, key: Key, generation: u64) -> Self {
        Self {
            entries: Rc::downgrade(entries),
            key,
            generation,
        }
    }

    /// Unregisters the entry now
    pub fn dispose(self) {}
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(entries) = self.entries.upgrade() {
            entries.borrow_mut().remove(&self.key, self.generation);
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let registry = Registry::new();
        let (entry, element, _) = task_entry();
        let _task = registry.register_task("a".parse().unwrap(), entry);
        let (column, _) = column_entry();
        let _column = registry.register_column(TaskStatus::Todo, column);

        let found = registry.task(&"a".parse().unwrap()).unwrap();
        found.element.flash();
        assert_eq!(element.flashes.get(), 1);

        assert!(registry.column(TaskStatus::Todo).is_some());
        assert!(registry.column(TaskStatus::Completed).is_none());
        assert!(registry.task(&"b".parse().unwrap()).is_none());
    }

    #[test]
    fn test_dispose_unregisters() {
        let registry = Registry::new();
        let (entry, _, _) = task_entry();
        let registration = registry.register_task("a".parse().unwrap(), entry);
        assert_eq!(registry.task_count(), 1);

        registration.dispose();
        assert_eq!(registry.task_count(), 0);

        let (column, _) = column_entry();
        {
            let _mounted = registry.register_column(TaskStatus::Todo, column);
            assert_eq!(registry.column_count(), 1);
        }
        assert_eq!(registry.column_count(), 0);
    }

    #[test]
    fn test_stale_disposer_keeps_remounted_entry() {
        let registry = Registry::new();
        let (first, _, _) = task_entry();
        let old = registry.register_task("a".parse().unwrap(), first);

        let (second, element, _) = task_entry();
        let _new = registry.register_task("a".parse().unwrap(), second);

        old.dispose();
        let found = registry.task(&"a".parse().unwrap()).unwrap();
        found.element.flash();
        assert_eq!(element.flashes.get(), 1);
    }

    #[test]
    fn test_registration_outliving_registry() {
        let registry = Registry::new();
        let (entry, _, _) = task_entry();
        let registration = registry.register_task("a".parse().unwrap(), entry);
        drop(registry);
        registration.dispose();
    }
}
