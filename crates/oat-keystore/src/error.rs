//! Keystore error types.

use oat_core::OatError;
use oat_crypto::ConfigError;
use thiserror::Error;

/// Errors from opening or administering a durable deployment.
#[derive(Error, Debug)]
pub enum KeystoreError {
    /// Configuration is missing or invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Engine or storage error
    #[error(transparent)]
    Oat(#[from] OatError),

    /// Writing command output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<oat_core::StorageError> for KeystoreError {
    fn from(err: oat_core::StorageError) -> Self {
        Self::Oat(OatError::Storage(err))
    }
}
