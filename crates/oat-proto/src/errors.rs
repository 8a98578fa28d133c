//! Error types for token decoding.

use thiserror::Error;

/// Result alias for wire-format operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Structural violations of the token wire format.
///
/// Every variant is a malformed-token condition. None of them carry secret
/// material, so they are safe to log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Token string has no `|` between header and footer
    #[error("token is missing the header/footer separator")]
    MissingSeparator,

    /// A segment is not valid standard base64
    #[error("invalid base64 in {segment}")]
    InvalidBase64 {
        /// Which segment failed to decode
        segment: &'static str,
    },

    /// A fixed-size structure has the wrong length
    #[error("invalid {segment} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Which structure was being decoded
        segment: &'static str,
        /// Required length
        expected: usize,
        /// Length received
        actual: usize,
    },

    /// A variable-size structure is shorter than its fixed prefix
    #[error("{segment} too short: need at least {min} bytes, got {actual}")]
    TooShort {
        /// Which structure was being decoded
        segment: &'static str,
        /// Minimum length
        min: usize,
        /// Length received
        actual: usize,
    },

    /// Footer fields are not a JSON object
    #[error("invalid session fields: {0}")]
    InvalidFields(String),

    /// Client id string is not 40 hex characters
    #[error("invalid client id: {0}")]
    InvalidClientId(String),
}
