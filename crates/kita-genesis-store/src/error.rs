//! Error types for the store module.

use kita_genesis_core::CoreError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Record not found.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Cursor could not be opened or advanced.
    #[error("iteration error: {0}")]
    Iteration(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Value error from the core types.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
