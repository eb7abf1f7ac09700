use thiserror::Error;

pub type Result<T> = std::result::Result<T, BoardError>;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task already exists: {0}")]
    DuplicateTask(String),

    #[error("Invalid task ID: {0:?}")]
    InvalidTaskId(String),

    #[error("Cannot move {item} {direction}: already at the edge")]
    MoveOutOfBounds { item: String, direction: String },

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Board not initialized")]
    BoardNotInitialized,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
