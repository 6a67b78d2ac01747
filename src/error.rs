//! Unified error handling for the sync pipeline.

use thiserror::Error;

/// Errors surfaced by graph loading, synthesis, and batch submission.
#[derive(Debug, Error)]
pub enum HasuraSyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Graph validation error: {0}")]
    GraphValidation(String),

    #[error("Unresolved table name for {0}")]
    UnresolvedTable(String),

    #[error("Sync incomplete: {0}")]
    SyncIncomplete(String),
}

pub type Result<T> = std::result::Result<T, HasuraSyncError>;
