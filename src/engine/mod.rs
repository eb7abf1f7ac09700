pub mod interpreter;
pub mod reorder;

pub use interpreter::{DragSource, DropEvent, DropInterpreter, DropTarget};
pub use reorder::{
    apply, move_across_columns, reorder, reorder_columns, reorder_destination_index,
    reorder_within_column, replay, Axis, Edge, Intent, TaskRef,
};
