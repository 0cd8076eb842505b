//! Container task helpers

pub mod netcore;

pub use netcore::NetCoreTaskHelper;
