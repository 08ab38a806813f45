//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during object-store operations.
///
/// These are opaque passthrough errors: the engine layered above never
/// reinterprets or retries them. Retry and backoff policy belongs to the
/// store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A read operation failed.
    #[error("read failed for key '{key}': {message}")]
    Read {
        /// The key being read.
        key: String,
        /// Description of the failure.
        message: String,
    },

    /// A write operation failed.
    #[error("write failed for key '{key}': {message}")]
    Write {
        /// The key being written.
        key: String,
        /// Description of the failure.
        message: String,
    },

    /// A listing operation failed.
    #[error("list failed for prefix '{prefix}': {message}")]
    List {
        /// The prefix being listed.
        prefix: String,
        /// Description of the failure.
        message: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Creates a read error.
    pub fn read(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Read {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a write error.
    pub fn write(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a list error.
    pub fn list(prefix: impl Into<String>, message: impl Into<String>) -> Self {
        Self::List {
            prefix: prefix.into(),
            message: message.into(),
        }
    }
}
