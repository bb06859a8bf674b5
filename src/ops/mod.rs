pub mod check;
pub mod entity_ops;
pub mod group_ops;
pub mod reorder;
pub mod task_ops;
