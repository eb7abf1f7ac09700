//! The state container a mounted board owns.
//!
//! All local changes are applied immediately. Writes to the backend are
//! queued and sent by [`BoardSession::flush`]; a failed write never rolls the
//! local state back. It marks the session stale, and the next
//! [`BoardSession::load`] replaces local tasks with the backend's.

use crate::{
    announce::{Announcer, LiveRegion, LogLiveRegion},
    domain::{
        BoardConfig, BoardInstanceId, BoardState, Operation, Outcome, Priority, Task, TaskId,
        TaskStatus, Trigger,
    },
    engine::{
        reorder::{self, Intent, TaskRef},
        DragSource, DropEvent, DropInterpreter,
    },
    error::{BoardError, Result},
    registry::Registry,
    storage::TaskBackend,
};
use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

/// A backend write waiting to be flushed
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    Create(Task),
    Delete(TaskId),
    UpdateStatus { id: TaskId, status: TaskStatus },
    Complete(TaskId),
}

/// Result of one [`BoardSession::flush`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub written: usize,
    pub failed: usize,
}

/// Which keyboard moves a column currently allows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnActions {
    pub can_move_left: bool,
    pub can_move_right: bool,
}

pub struct BoardSession<B, L = LogLiveRegion> {
    backend: B,
    config: BoardConfig,
    state: BoardState,
    registry: Registry,
    interpreter: DropInterpreter,
    announcer: Announcer<L>,
    pending: Vec<PendingWrite>,
    load_error: Option<String>,
    stale: bool,
}

impl<B: TaskBackend> BoardSession<B> {
    /// Creates a session that logs its announcements
    pub fn new(backend: B, config: BoardConfig) -> Result<Self> {
        Self::with_live_region(backend, config, LogLiveRegion)
    }

    /// Creates a session from the configuration stored in the backend
    pub async fn open(backend: B) -> Result<Self> {
        let config = backend.load_config().await?;
        Self::new(backend, config)
    }
}

impl<B: TaskBackend, L: LiveRegion> BoardSession<B, L> {
    pub fn with_live_region(backend: B, config: BoardConfig, live_region: L) -> Result<Self> {
        config.validate()?;
        let instance_id = BoardInstanceId::new();
        debug!(board = %config.name, %instance_id, "Opening board session");

        Ok(Self {
            backend,
            state: BoardState::from_config(&config),
            config,
            registry: Registry::new(),
            interpreter: DropInterpreter::new(instance_id),
            announcer: Announcer::new(live_region),
            pending: Vec::new(),
            load_error: None,
            stale: false,
        })
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Registry the UI layer registers mounted cards and columns in
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn instance_id(&self) -> BoardInstanceId {
        self.interpreter.instance_id()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Error text from the last failed load, for display in place of the board
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Whether a backend write failed since the last successful load
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn pending_writes(&self) -> &[PendingWrite] {
        &self.pending
    }

    /// Drag payload for a task card of this board
    pub fn task_drag_source(&self, task_id: TaskId) -> DragSource {
        DragSource::Task {
            task_id,
            instance_id: self.instance_id(),
        }
    }

    /// Drag payload for a column of this board
    pub fn column_drag_source(&self, column_id: TaskStatus) -> DragSource {
        DragSource::Column {
            column_id,
            instance_id: self.instance_id(),
        }
    }

    /// Fetches the current user's tasks and replaces the local list.
    ///
    /// On failure the local tasks stay as they were and the error text is
    /// kept for [`load_error`](Self::load_error).
    pub async fn load(&mut self) -> Result<()> {
        match self.backend.fetch_tasks(&self.config.current_user).await {
            Ok(tasks) => {
                info!(user = %self.config.current_user, count = tasks.len(), "Loaded tasks");
                self.state.tasks.replace_all(tasks);
                self.load_error = None;
                self.stale = false;
                Ok(())
            }
            Err(err) => {
                warn!(user = %self.config.current_user, %err, "Failed to load tasks");
                self.load_error = Some(format!("Unable to fetch tasks: {}", err));
                Err(err)
            }
        }
    }

    /// Applies a drop reported by the UI; ignored drops return `None`
    pub fn handle_drop(&mut self, event: &DropEvent) -> Option<Operation> {
        let intent = self.interpreter.interpret(&self.state, event)?;
        let operation = self.commit(&intent, Trigger::Pointer)?;
        self.queue_status_change(&operation);
        Some(operation)
    }

    /// Like [`handle_drop`](Self::handle_drop), for a JSON drop payload.
    /// Malformed payloads are ignored.
    pub fn handle_drop_json(&mut self, payload: &str) -> Option<Operation> {
        match DropEvent::from_json(payload) {
            Ok(event) => self.handle_drop(&event),
            Err(err) => {
                debug!(%err, "Ignoring malformed drop payload");
                None
            }
        }
    }

    pub fn column_actions(&self, column: TaskStatus) -> Option<ColumnActions> {
        let index = self.state.column_index(column)?;
        Some(ColumnActions {
            can_move_left: index > 0,
            can_move_right: index + 1 < self.state.ordered_column_ids.len(),
        })
    }

    pub fn move_column_left(&mut self, column: TaskStatus) -> Result<Operation> {
        let index = self.require_column(column)?;
        if index == 0 {
            return Err(out_of_bounds(column, "left"));
        }
        self.commit_keyboard(Intent::ReorderColumn {
            start_index: index,
            finish_index: index - 1,
        })
    }

    pub fn move_column_right(&mut self, column: TaskStatus) -> Result<Operation> {
        let index = self.require_column(column)?;
        if index + 1 >= self.state.ordered_column_ids.len() {
            return Err(out_of_bounds(column, "right"));
        }
        self.commit_keyboard(Intent::ReorderColumn {
            start_index: index,
            finish_index: index + 1,
        })
    }

    pub fn move_task_up(&mut self, id: &TaskId) -> Result<Operation> {
        let (column, index) = self.require_task(id)?;
        if index == 0 {
            return Err(out_of_bounds(id, "up"));
        }
        self.commit_keyboard(Intent::ReorderTask {
            column_id: column,
            start_index: index,
            finish_index: index - 1,
        })
    }

    pub fn move_task_down(&mut self, id: &TaskId) -> Result<Operation> {
        let (column, index) = self.require_task(id)?;
        if index + 1 >= self.state.tasks.column_len(column) {
            return Err(out_of_bounds(id, "down"));
        }
        self.commit_keyboard(Intent::ReorderTask {
            column_id: column,
            start_index: index,
            finish_index: index + 1,
        })
    }

    /// Moves a task to the end of another column
    pub fn move_task_to_column(&mut self, id: &TaskId, to: TaskStatus) -> Result<Operation> {
        let (from, index) = self.require_task(id)?;
        if from == to {
            return Err(BoardError::InvalidMove(format!("{} is already in {}", id, to)));
        }
        self.require_column(to)?;
        let operation = self.commit_keyboard(Intent::MoveTask {
            task: TaskRef::Index(index),
            from,
            to,
            destination_index: None,
        })?;
        self.queue_status_change(&operation);
        Ok(operation)
    }

    /// Moves a task to the end of the completed column
    pub fn complete_task(&mut self, id: &TaskId) -> Result<Operation> {
        let (from, index) = self.require_task(id)?;
        if from == TaskStatus::Completed {
            return Err(BoardError::InvalidMove(format!("{} is already completed", id)));
        }
        let operation = self.commit_keyboard(Intent::MoveTask {
            task: TaskRef::Index(index),
            from,
            to: TaskStatus::Completed,
            destination_index: None,
        })?;
        self.pending.push(PendingWrite::Complete(id.clone()));
        Ok(operation)
    }

    /// A new task pre-filled the way the "add task" button creates it
    pub fn draft_task(&self) -> Task {
        Task::new(
            TaskId::generate(),
            format!("New Task {}", self.state.tasks.len() + 1),
        )
        .with_description("Description for the new task".to_string())
        .with_priority(Priority::Medium)
        .with_deadline(Utc::now() + Duration::days(7))
    }

    /// Appends a task locally and queues its creation
    pub fn add_task(&mut self, task: Task) -> Result<()> {
        self.state.tasks.add(task.clone())?;
        info!(task_id = %task.id, "Added task");
        self.pending.push(PendingWrite::Create(task));
        Ok(())
    }

    /// Replaces a task locally. Unknown ids are ignored and return `false`.
    ///
    /// Only a status change is sent to the backend.
    pub fn update_task(&mut self, task: Task) -> bool {
        let previous = self.state.tasks.get(&task.id).map(|t| t.status);
        let (id, status) = (task.id.clone(), task.status);
        if !self.state.tasks.update(task) {
            return false;
        }
        if previous != Some(status) {
            self.pending.push(PendingWrite::UpdateStatus { id, status });
        }
        true
    }

    pub fn delete_task(&mut self, id: &TaskId) -> Result<Task> {
        let task = self
            .state
            .tasks
            .delete(id)
            .ok_or_else(|| BoardError::TaskNotFound(id.to_string()))?;
        info!(task_id = %id, "Deleted task");
        self.pending.push(PendingWrite::Delete(id.clone()));
        Ok(task)
    }

    /// Sends queued writes to the backend, in order.
    ///
    /// Failed writes are logged and dropped; nothing is retried. A write
    /// leaves the queue only once its backend call has finished, so a flush
    /// that is cancelled part way keeps the unsent writes for the next one.
    pub async fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();
        let user = self.config.current_user.clone();

        while let Some(write) = self.pending.first().cloned() {
            let result = match &write {
                PendingWrite::Create(task) => {
                    self.backend.create_task(&user, task).await.map(|_| ())
                }
                PendingWrite::Delete(id) => self.backend.delete_task(id).await,
                PendingWrite::UpdateStatus { id, status } => {
                    self.backend.update_task_status(id, *status).await
                }
                PendingWrite::Complete(id) => self.backend.complete_task(id).await,
            };
            self.pending.remove(0);
            match result {
                Ok(()) => report.written += 1,
                Err(err) => {
                    warn!(?write, %err, "Backend write failed; local board kept as is");
                    report.failed += 1;
                    self.stale = true;
                }
            }
        }

        if report.written + report.failed > 0 {
            debug!(written = report.written, failed = report.failed, "Flushed pending writes");
        }
        report
    }

    fn commit(&mut self, intent: &Intent, trigger: Trigger) -> Option<Operation> {
        let next = reorder::apply(&self.state, intent, trigger)?;
        self.state = next;
        let operation = self.state.last_operation.clone()?;
        info!(?operation, "Committed board operation");
        self.announcer.react(&self.state, &self.registry);
        Some(operation)
    }

    fn commit_keyboard(&mut self, intent: Intent) -> Result<Operation> {
        self.commit(&intent, Trigger::Keyboard)
            .ok_or_else(|| BoardError::InvalidMove(format!("{:?} does not apply", intent)))
    }

    fn queue_status_change(&mut self, operation: &Operation) {
        if let Outcome::TaskMove {
            finish_column_id,
            index_in_finish_column,
            ..
        } = operation.outcome
        {
            if let Some(task) = self
                .state
                .tasks
                .task_in_column(finish_column_id, index_in_finish_column)
            {
                self.pending.push(PendingWrite::UpdateStatus {
                    id: task.id.clone(),
                    status: finish_column_id,
                });
            }
        }
    }

    fn require_column(&self, column: TaskStatus) -> Result<usize> {
        self.state
            .column_index(column)
            .ok_or_else(|| {
                BoardError::ConfigError(format!("Column {} is not on the board", column.as_str()))
            })
    }

    fn require_task(&self, id: &TaskId) -> Result<(TaskStatus, usize)> {
        self.state
            .tasks
            .locate(id)
            .ok_or_else(|| BoardError::TaskNotFound(id.to_string()))
    }
}

fn out_of_bounds(item: impl std::fmt::Display, direction: &str) -> BoardError {
    BoardError::MoveOutOfBounds {
        item: item.to_string(),
        direction: direction.to_string(),
    }
}
