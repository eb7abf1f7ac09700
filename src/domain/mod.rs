pub mod board;
pub mod store;
pub mod task;

pub use board::{BoardConfig, BoardInstanceId, BoardState, Operation, Outcome, Trigger, UserId};
pub use store::TaskStore;
pub use task::{Priority, Task, TaskId, TaskStatus};
