use crate::{
    domain::{BoardConfig, Task, TaskId, TaskStatus, UserId},
    error::Result,
};
use async_trait::async_trait;

pub mod file_storage;

/// Backend that persists tasks for the board.
///
/// Every call reports failure through `Err`; callers decide whether to
/// surface it or only log it.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Initializes the storage backend
    async fn initialize(&self) -> Result<()>;

    /// Lists all tasks owned by `user`, in creation order
    async fn fetch_tasks(&self, user: &UserId) -> Result<Vec<Task>>;

    /// Stores a new task owned by `user`
    async fn create_task(&self, user: &UserId, task: &Task) -> Result<Task>;

    /// Deletes a task
    async fn delete_task(&self, id: &TaskId) -> Result<()>;

    /// Changes the status of a stored task
    async fn update_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<()>;

    /// Marks a stored task as completed
    async fn complete_task(&self, id: &TaskId) -> Result<()> {
        self.update_task_status(id, TaskStatus::Completed).await
    }

    /// Saves the board configuration
    async fn save_config(&self, config: &BoardConfig) -> Result<()>;

    /// Loads the board configuration
    async fn load_config(&self) -> Result<BoardConfig>;

    /// Checks if the backend is initialized
    async fn is_initialized(&self) -> bool;
}
