//! Error types for the OAT protocol engines.
//!
//! Each layer keeps its own error type and is wrapped upward: wire format
//! ([`ProtocolError`]), primitives ([`CryptoError`]), configuration
//! ([`ConfigError`]), persistence ([`StorageError`]), and request
//! authentication ([`AuthError`]). [`OatError`] is what the engines return.

use oat_crypto::{ConfigError, CryptoError};
use oat_proto::{ClientId, ProtocolError};
use thiserror::Error;

use crate::storage::StorageError;

/// Reasons a roll request fails authentication.
///
/// Checks run in the order listed. The first failure wins.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Header signature does not verify against the registered key
    #[error("bad signature")]
    BadSignature,

    /// Signed domain differs from the server's configured domain
    #[error("domain mismatch")]
    DomainMismatch,

    /// Footer HMAC does not cover the presented fields and api key
    #[error("session fields tampered")]
    FieldsTampered,

    /// Presented api key is not the generation being tested
    #[error("api key mismatch")]
    KeyMismatch,
}

/// Failure reported by an application-supplied transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transport failed: {0}")]
pub struct TransportError(pub String);

/// Errors returned by [`crate::OatServer`] and [`crate::OatClient`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OatError {
    /// Missing or invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Primitive failure, including AEAD tamper detection
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Token or init request violates the wire format
    #[error("malformed token: {0}")]
    MalformedToken(#[from] ProtocolError),

    /// Request failed authentication
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Neither retained api key generation matches; re-initialization is
    /// required
    #[error("token mismatch for client {0}")]
    TokenMismatch(ClientId),

    /// Server holds no key material for this client id
    #[error("unknown client {0}")]
    UnknownClient(ClientId),

    /// Client holds no identity for this domain
    #[error("no identity for domain {0:?}")]
    UnknownDomain(String),

    /// Client-computed id disagrees with the id the server issued
    #[error("client id mismatch: computed {computed}, server sent {received}")]
    IdentityMismatch {
        /// Id derived locally from the shared secret
        computed: ClientId,
        /// Id carried in the server's footer
        received: ClientId,
    },

    /// Persistence failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl OatError {
    /// Returns true if the client must run key exchange again.
    ///
    /// Terminal for the identity: no amount of retrying a roll recovers it.
    pub fn requires_reinit(&self) -> bool {
        matches!(self, Self::TokenMismatch(_) | Self::UnknownClient(_) | Self::IdentityMismatch { .. })
    }

    /// Returns true if repeating the same call may succeed.
    ///
    /// A lost compare-and-swap race or a failed transport leaves both sides
    /// in a state the resync window can absorb.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(StorageError::Conflict { .. }) | Self::Transport(_))
    }
}
