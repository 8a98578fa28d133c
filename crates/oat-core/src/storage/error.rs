//! Storage error types.
//!
//! Defines errors that can occur during storage operations:
//! - `NotFound`: Requested record doesn't exist
//! - `Conflict`: Compare-and-swap lost to a concurrent writer
//! - `Serialization`: Failed to encode/decode a record
//! - `Io`: Underlying storage system errors

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Record not found
    #[error("record not found: {key}")]
    NotFound {
        /// Client id (hex) or domain that was not found
        key: String,
    },

    /// Ratchet compare-and-swap lost
    ///
    /// The stored ratchet no longer equals the value the caller read, i.e.
    /// another roll for the same client committed in between.
    #[error("ratchet conflict for client {client_id}")]
    Conflict {
        /// Client id (hex) whose ratchet changed underneath the caller
        client_id: String,
    },

    /// Serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error (file system, database, etc.)
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}
