pub mod filter;
pub mod store;
pub mod task;
pub mod timeline;
pub mod tree;

pub use store::ScheduleStore;
pub use task::{Task, TaskPatch};
pub use timeline::{BarGeometry, BarKind, Timeline};
pub use tree::ReorderError;
