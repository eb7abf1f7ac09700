//! # Taskboard Core
//!
//! Board state and drag-and-drop logic for a kanban task board.
//!
//! Tasks live in one flat list; each status column is a filtered view of it.
//! Drops reported by a UI are classified by the [`engine::DropInterpreter`],
//! applied by the pure functions in [`engine::reorder`], and acknowledged by
//! the [`announce::Announcer`]. A [`session::BoardSession`] ties these
//! together and queues changes for a [`storage::TaskBackend`].

pub mod announce;
pub mod domain;
pub mod engine;
pub mod error;
pub mod registry;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use announce::{Announcer, LiveRegion, LogLiveRegion};
pub use domain::{
    board::{BoardConfig, BoardInstanceId, BoardState, Operation, Outcome, Trigger, UserId},
    store::TaskStore,
    task::{Priority, Task, TaskId, TaskStatus},
};
pub use engine::{DragSource, DropEvent, DropInterpreter, DropTarget, Edge, Intent};
pub use error::{BoardError, Result};
pub use registry::{ColumnEntry, ElementHandle, Registration, Registry, TaskEntry};
pub use session::{BoardSession, FlushReport, PendingWrite};
pub use storage::{file_storage::FileStorage, TaskBackend};
