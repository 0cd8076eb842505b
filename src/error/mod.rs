//! Error types and handlers for workbench operations

pub mod handlers;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkbenchError>;

#[derive(Debug, Clone, Error)]
pub enum WorkbenchError {
    /// Network related errors
    #[error("Network error: {0}")]
    Network(String),
    /// Registry related errors
    #[error("Registry error: {0}")]
    Registry(String),
    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),
    /// File IO errors
    #[error("IO error: {0}")]
    Io(String),
    /// Parse errors
    #[error("Parse error: {0}")]
    Parse(String),
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// The registry does not support the requested operation (HTTP 405 or provider report)
    #[error("Unsupported: {0}")]
    Unsupported(String),
    /// An external command exited unsuccessfully
    #[error("Command `{command}` failed with exit code {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    /// The user dismissed a prompt or confirmation; not a failure
    #[error("Operation cancelled{}", .0.as_deref().map(|r| format!(" ({})", r)).unwrap_or_default())]
    Cancelled(Option<String>),
    /// Several independent operations failed
    #[error("{} operations failed: {}", .0.len(), join_errors(.0))]
    Aggregate(Vec<WorkbenchError>),
}

fn join_errors(errors: &[WorkbenchError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl WorkbenchError {
    pub fn cancelled() -> Self {
        WorkbenchError::Cancelled(None)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkbenchError::Cancelled(_))
    }

    /// Collapse a batch of failures; a single failure is returned as is
    pub fn aggregate(mut errors: Vec<WorkbenchError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(WorkbenchError::Aggregate(errors)),
        }
    }

    /// Capability gaps are downgraded to a warning by command handlers
    pub fn is_unsupported(&self) -> bool {
        matches!(self, WorkbenchError::Unsupported(_))
    }
}

impl From<std::io::Error> for WorkbenchError {
    fn from(err: std::io::Error) -> Self {
        WorkbenchError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for WorkbenchError {
    fn from(err: serde_json::Error) -> Self {
        WorkbenchError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for WorkbenchError {
    fn from(err: reqwest::Error) -> Self {
        WorkbenchError::Network(err.to_string())
    }
}

impl From<url::ParseError> for WorkbenchError {
    fn from(err: url::ParseError) -> Self {
        WorkbenchError::Validation(err.to_string())
    }
}

impl From<regex::Error> for WorkbenchError {
    fn from(err: regex::Error) -> Self {
        WorkbenchError::Config(format!("Invalid pattern: {}", err))
    }
}

impl From<toml::de::Error> for WorkbenchError {
    fn from(err: toml::de::Error) -> Self {
        WorkbenchError::Config(err.to_string())
    }
}
