//! Error types for workbench
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in the workbench tools
#[derive(Debug, Error)]
pub enum WorkbenchError {
    /// A post page or Markdown source does not exist
    #[error("Post not found: {0}")]
    PostNotFound(String),

    /// Input data was present but unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Template registration or rendering failed
    #[error("Template error: {0}")]
    Template(String),

    /// Dev server failure other than a busy port
    #[error("Server error: {0}")]
    Server(String),

    /// The dev server port is already taken
    #[error("Port {0} is already in use")]
    PortInUse(u16),

    /// Bad glob pattern while scanning for files
    #[error("Pattern error: {0}")]
    Pattern(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for workbench operations
pub type Result<T> = std::result::Result<T, WorkbenchError>;
