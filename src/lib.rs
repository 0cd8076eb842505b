//! Docker Workbench Library
//!
//! Container and registry workflows behind a command palette: image builds,
//! compose up/down with service and profile subsets, tagging, and remote
//! registry digest/tag/delete operations with bearer-token authentication.

pub mod cli;
pub mod commands;
pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod image;
pub mod logging;
pub mod prompt;
pub mod registry;
pub mod runner;
pub mod state;
pub mod tasks;
pub mod telemetry;
pub mod templates;
pub mod workbench;

pub use config::AppConfig;
pub use error::{Result, WorkbenchError};
pub use logging::Logger;
pub use workbench::Workbench;
