//! Error types for dictionary import.

use thiserror::Error;

/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Errors that can occur while parsing an uploaded dictionary file.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The file extension is not one of the recognized upload formats.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    /// The file has a recognized format but its content cannot be used.
    #[error("malformed dictionary: {reason}")]
    Malformed { reason: String },
}
