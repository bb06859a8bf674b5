pub mod config;
pub mod document;
pub mod group;
pub mod label;
pub mod project;
pub mod task;

pub use config::*;
pub use document::*;
pub use group::*;
pub use label::*;
pub use project::*;
pub use task::*;
