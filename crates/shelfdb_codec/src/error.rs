//! Error types for codec operations.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding documents.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The byte content is not well-formed JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required reserved field is missing from the stored object.
    #[error("missing required field '{field}'")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// A reserved field is present but malformed.
    #[error("invalid field '{field}': {message}")]
    InvalidField {
        /// Name of the malformed field.
        field: String,
        /// Description of what is wrong with it.
        message: String,
    },
}

impl CodecError {
    /// Creates a missing-field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid-field error.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}
