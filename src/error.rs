//! Error types for context window management.
//!
//! This module provides the error hierarchy using `thiserror`. The buffer is
//! deliberately hard to break at runtime: the only fatal path is an invalid
//! construction configuration. Compression problems are surfaced as explicit
//! results so the caller can fall back instead of failing an insertion.

use thiserror::Error;

/// Result type alias for context buffer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for context buffer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid buffer configuration (fails fast at construction).
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Payload compression errors (recoverable; callers fall back).
    #[error("compression error: {0}")]
    Compression(#[from] CompressionError),
}

/// Compression-specific errors for sensor payload handling.
///
/// These never abort an insertion: the buffer catches them and stores a
/// truncated string rendition of the payload instead.
#[derive(Error, Debug)]
pub enum CompressionError {
    /// Payload could not be serialized for size estimation.
    #[error("payload serialization failed: {0}")]
    Serialization(String),

    /// A numeric field was outside the representable JSON range.
    #[error("non-finite number in field: {field}")]
    NonFiniteNumber {
        /// Name of the offending field.
        field: String,
    },
}

impl From<serde_json::Error> for CompressionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
