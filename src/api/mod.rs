//! HTTP API over the document store.

pub mod error;
pub mod server;
pub mod types;

mod entities;
mod groups;
mod tasks;

pub use error::{ApiError, ValidatedJson};
pub use server::{AppState, router, serve};
