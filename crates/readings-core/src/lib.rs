//! Readings Core - Shared functionality for readings tools
//!
//! Answers "which application am I?" and "where do its files live?" for
//! every tool in the workspace.

pub mod config;
pub mod format;
pub mod must;
pub mod paths;

pub use config::AppConfig;
pub use must::{must_get, MustGetError};
pub use paths::Paths;
