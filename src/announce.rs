//! Post-move feedback: flash the moved element, and for keyboard-driven
//! moves tell assistive technology what happened and keep focus on the task.

use crate::{
    domain::board::{BoardState, Outcome, Trigger},
    registry::Registry,
};
use std::rc::Rc;
use tracing::{debug, info};

/// Screen-reader live region
pub trait LiveRegion {
    fn announce(&self, message: &str);
}

impl<L: LiveRegion + ?Sized> LiveRegion for Rc<L> {
    fn announce(&self, message: &str) {
        (**self).announce(message)
    }
}

/// Live region that only writes announcements to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLiveRegion;

impl LiveRegion for LogLiveRegion {
    fn announce(&self, message: &str) {
        info!(announcement = message, "Live region announcement");
    }
}

#[derive(Debug, Clone, Default)]
pub struct Announcer<L> {
    live_region: L,
}

impl<L: LiveRegion> Announcer<L> {
    pub fn new(live_region: L) -> Self {
        Self { live_region }
    }

    /// Gives feedback for `state.last_operation`.
    ///
    /// Returns the announced message, if any. Anything that cannot be found
    /// (unmounted element, no task at the recorded index) ends the reaction
    /// quietly.
    pub fn react(&self, state: &BoardState, registry: &Registry) -> Option<String> {
        let operation = state.last_operation.as_ref()?;
        let keyboard = operation.trigger == Trigger::Keyboard;

        let message = match &operation.outcome {
            Outcome::ColumnReorder {
                start_index,
                finish_index,
                ..
            } => {
                let column = *state.ordered_column_ids.get(*finish_index)?;
                let Some(entry) = registry.column(column) else {
                    debug!(column = column.as_str(), "Moved column is not mounted");
                    return None;
                };
                entry.element.flash();

                if !keyboard {
                    return None;
                }
                format!(
                    "You've moved {} from position {} to position {} of {}.",
                    column,
                    start_index + 1,
                    finish_index + 1,
                    state.ordered_column_ids.len()
                )
            }
            Outcome::TaskReorder {
                column_id,
                start_index,
                finish_index,
            } => {
                let task = state.tasks.task_in_column(*column_id, *finish_index)?;
                let Some(entry) = registry.task(&task.id) else {
                    debug!(task_id = %task.id, "Moved task is not mounted");
                    return None;
                };
                entry.element.flash();

                if !keyboard {
                    return None;
                }
                let message = format!(
                    "You've moved {} from position {} to position {} in the {} column.",
                    task.title,
                    start_index + 1,
                    finish_index + 1,
                    column_id
                );
                entry.action_menu_trigger.focus();
                message
            }
            Outcome::TaskMove {
                finish_column_id,
                index_in_finish_column,
                ..
            } => {
                let task = state
                    .tasks
                    .task_in_column(*finish_column_id, *index_in_finish_column)?;
                let Some(entry) = registry.task(&task.id) else {
                    debug!(task_id = %task.id, "Moved task is not mounted");
                    return None;
                };
                entry.element.flash();

                if !keyboard {
                    return None;
                }
                let message = format!(
                    "You've moved {} to position {} in the {} column.",
                    task.title,
                    index_in_finish_column + 1,
                    finish_column_id
                );
                entry.action_menu_trigger.focus();
                message
            }
        };

        self.live_region.announce(&message);
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            store::TaskStore,
            task::{Task, TaskStatus},
        },
        engine::reorder::{move_across_columns, reorder_columns, reorder_within_column},
        registry::testing::{column_entry, task_entry},
    };
    use std::cell::RefCell;

    #[derive(Default)]
    struct Transcript(RefCell<Vec<String>>);

    impl LiveRegion for Transcript {
        fn announce(&self, message: &str) {
            self.0.borrow_mut().push(message.to_string());
        }
    }

    fn state() -> BoardState {
        let tasks = vec![
            Task::new("a".parse().unwrap(), "Write tests".to_string()),
            Task::new("b".parse().unwrap(), "Fix login".to_string()),
            Task::new("c".parse().unwrap(), "Deploy".to_string())
                .with_status(TaskStatus::Completed),
        ];
        BoardState::new(TaskStore::from_tasks(tasks), TaskStatus::ALL.to_vec())
    }

    #[test]
    fn test_nothing_to_announce_without_operation() {
        let announcer = Announcer::new(Transcript::default());
        assert_eq!(announcer.react(&state(), &Registry::new()), None);
    }

    #[test]
    fn test_keyboard_column_reorder() {
        let transcript = Rc::new(Transcript::default());
        let announcer = Announcer::new(transcript.clone());
        let registry = Registry::new();
        let (entry, element) = column_entry();
        let _mounted = registry.register_column(TaskStatus::Todo, entry);

        let next = reorder_columns(&state(), 0, 1, Trigger::Keyboard).unwrap();
        let message = announcer.react(&next, &registry).unwrap();

        assert_eq!(message, "You've moved TODO from position 1 to position 2 of 4.");
        assert_eq!(element.flashes.get(), 1);
        assert_eq!(transcript.0.borrow().len(), 1);
    }

    #[test]
    fn test_pointer_moves_flash_without_announcing() {
        let transcript = Rc::new(Transcript::default());
        let announcer = Announcer::new(transcript.clone());
        let registry = Registry::new();
        let (entry, element, trigger) = task_entry();
        let _mounted = registry.register_task("a".parse().unwrap(), entry);

        let next =
            reorder_within_column(&state(), TaskStatus::Todo, 0, 1, Trigger::Pointer).unwrap();
        assert_eq!(announcer.react(&next, &registry), None);

        assert_eq!(element.flashes.get(), 1);
        assert_eq!(trigger.focuses.get(), 0);
        assert!(transcript.0.borrow().is_empty());
    }

    #[test]
    fn test_keyboard_task_reorder_moves_focus() {
        let announcer = Announcer::new(LogLiveRegion);
        let registry = Registry::new();
        let (entry, element, trigger) = task_entry();
        let _mounted = registry.register_task("a".parse().unwrap(), entry);

        let next =
            reorder_within_column(&state(), TaskStatus::Todo, 0, 1, Trigger::Keyboard).unwrap();
        let message = announcer.react(&next, &registry).unwrap();

        assert_eq!(
            message,
            "You've moved Write tests from position 1 to position 2 in the TODO column."
        );
        assert_eq!(element.flashes.get(), 1);
        assert_eq!(trigger.focuses.get(), 1);
    }

    #[test]
    fn test_keyboard_task_move() {
        let announcer = Announcer::new(LogLiveRegion);
        let registry = Registry::new();
        let (entry, _, trigger) = task_entry();
        let _mounted = registry.register_task("b".parse().unwrap(), entry);

        let next = move_across_columns(
            &state(),
            1usize,
            TaskStatus::Todo,
            TaskStatus::InProgress,
            None,
            Trigger::Keyboard,
        )
        .unwrap();
        let message = announcer.react(&next, &registry).unwrap();

        assert_eq!(message, "You've moved Fix login to position 1 in the IN PROGRESS column.");
        assert_eq!(trigger.focuses.get(), 1);
    }

    #[test]
    fn test_unmounted_entity_is_skipped() {
        let transcript = Rc::new(Transcript::default());
        let announcer = Announcer::new(transcript.clone());
        let registry = Registry::new();

        let next =
            reorder_within_column(&state(), TaskStatus::Todo, 0, 1, Trigger::Keyboard).unwrap();
        assert_eq!(announcer.react(&next, &registry), None);

        let next = reorder_columns(&state(), 0, 1, Trigger::Keyboard).unwrap();
        assert_eq!(announcer.react(&next, &registry), None);

        assert!(transcript.0.borrow().is_empty());
    }
}
