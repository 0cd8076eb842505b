//! Command line interface module
//!
//! Argument parsing and the runner that maps each subcommand onto its handler.

pub mod args;
pub mod runner;

pub use args::Args;
pub use runner::Runner;
