//! Error types for threadchat
//!
//! Two layers, both built with `thiserror`:
//!
//! - [`StoreError`]: failures raised by an ordered store (I/O, WAL corruption,
//!   serialization of values, process locking).
//! - [`ChatError`]: the caller-facing taxonomy. Every store failure surfaces
//!   as [`ChatError::Internal`] unchanged.

use std::io;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for chat operations
pub type ChatResult<T> = std::result::Result<T, ChatError>;

/// Errors raised by an ordered store
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error (file operations, fsync, directory creation)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Persisted data failed validation
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Store directory is held by another process
    #[error("Store locked: {0}")]
    Locked(String),

    /// Any other engine failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Caller-facing error taxonomy
#[derive(Debug, Error)]
pub enum ChatError {
    /// Malformed or missing caller input; recoverable by correcting the call
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Relationship policy violation (blocked sender or target)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Point lookup miss
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying store failure, surfaced as-is
    #[error("Internal error: {0}")]
    Internal(#[from] StoreError),
}

impl ChatError {
    /// Shorthand for [`ChatError::InvalidArgument`]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ChatError::InvalidArgument(msg.into())
    }

    /// Shorthand for [`ChatError::Forbidden`]
    pub fn forbidden(msg: impl Into<String>) -> Self {
        ChatError::Forbidden(msg.into())
    }

    /// Shorthand for [`ChatError::NotFound`]
    pub fn not_found(msg: impl Into<String>) -> Self {
        ChatError::NotFound(msg.into())
    }

    /// Stable, lowercase name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::InvalidArgument(_) => "invalid_argument",
            ChatError::Forbidden(_) => "forbidden",
            ChatError::NotFound(_) => "not_found",
            ChatError::Internal(_) => "internal",
        }
    }
}
