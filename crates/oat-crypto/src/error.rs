//! Error types for cryptographic operations and configuration.

use thiserror::Error;

/// Failures of a cryptographic primitive.
///
/// Variants are deliberately coarse. Callers must not be able to learn
/// which sub-check of an AEAD or signature operation failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// AEAD open failed (wrong key, tampered ciphertext, or truncated blob)
    #[error("decryption failed")]
    DecryptionFailed,

    /// Signature did not verify against the registered key
    #[error("signature verification failed")]
    BadSignature,

    /// Bytes are not a valid public key
    #[error("invalid public key")]
    InvalidPublicKey,

    /// X25519 produced an all-zero shared secret (low-order peer point)
    #[error("key exchange produced a non-contributory shared secret")]
    NonContributory,

    /// Key material has the wrong length
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required length
        expected: usize,
        /// Length received
        actual: usize,
    },
}

/// Invalid or missing configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Vault password is shorter than the configured minimum
    #[error("password must be at least {min} bytes, got {actual}")]
    PasswordTooShort {
        /// Minimum accepted length
        min: usize,
        /// Length supplied
        actual: usize,
    },

    /// A required setting is missing
    #[error("missing configuration: {0}")]
    Missing(&'static str),

    /// A setting is present but unusable
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Setting name
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}
