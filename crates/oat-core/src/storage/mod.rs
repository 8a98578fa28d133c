//! Storage abstraction for OAT key material
//!
//! Trait-based abstraction for persisting per-identity key material. The
//! traits are synchronous (no async) and every secret they carry is already
//! sealed by the vault, so implementations never see plaintext keys.
//!
//! The server side is keyed by [`ClientId`]; the client side by domain.
//! The only mutation on the hot path, advancing a server ratchet, is an
//! atomic compare-and-swap so concurrent rolls for one client cannot fork
//! the key chain.

mod error;
mod memory;

pub use error::StorageError;
pub use memory::{MemoryClientStore, MemoryKeyStore};
use oat_proto::ClientId;
use serde::{Deserialize, Serialize};

/// The two retained api key generations, each sealed by the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedRatchet {
    /// Most recently issued generation
    pub current: Vec<u8>,
    /// Generation `current` replaced on the last primary roll
    pub previous: Vec<u8>,
}

/// Server-held key material for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Sealed X25519 shared key
    pub shared_key: Vec<u8>,
    /// Sealed Ed25519 verifying key
    pub verifying_key: Vec<u8>,
    /// Sealed api key generations
    pub ratchet: SealedRatchet,
}

/// Client-held key material for one server domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    /// Id the server assigned (and the client verified)
    pub client_id: ClientId,
    /// Sealed X25519 shared key
    pub shared_key: Vec<u8>,
    /// Sealed Ed25519 signing key
    pub signing_key: Vec<u8>,
    /// Sealed copy of the latest token received from the server
    pub token: Vec<u8>,
}

/// Server-side key store.
///
/// Must be Clone (shared by request handlers), Send + Sync (thread-safe),
/// and synchronous. Implementations typically share internal state via Arc,
/// so clones access the same underlying storage.
///
/// # Panics
///
/// Implementations may panic if internal synchronization primitives are
/// poisoned. Acceptable for test/simulation code.
pub trait KeyStore: Clone + Send + Sync + 'static {
    /// Store a freshly initialized client, replacing any previous record
    /// under the same id.
    fn insert_client(&self, client_id: &ClientId, record: &KeyRecord) -> Result<(), StorageError>;

    /// Load a client's record. `None` if the client is unknown.
    fn load_client(&self, client_id: &ClientId) -> Result<Option<KeyRecord>, StorageError>;

    /// Atomically replace the ratchet if it still equals `expected`.
    ///
    /// # Errors
    ///
    /// - `NotFound`: the client has been removed
    /// - `Conflict`: the stored ratchet differs from `expected`
    fn swap_ratchet(
        &self,
        client_id: &ClientId,
        expected: &SealedRatchet,
        next: &SealedRatchet,
    ) -> Result<(), StorageError>;

    /// Erase a client. Idempotent: removing an absent client succeeds.
    fn remove_client(&self, client_id: &ClientId) -> Result<(), StorageError>;

    /// All stored client ids, in ascending order.
    fn list_clients(&self) -> Result<Vec<ClientId>, StorageError>;
}

/// Client-side identity store.
///
/// Same threading contract as [`KeyStore`].
pub trait ClientStore: Clone + Send + Sync + 'static {
    /// Store the identity for `domain`, replacing any previous one.
    fn store_identity(&self, domain: &str, record: &ClientRecord) -> Result<(), StorageError>;

    /// Load the identity for `domain`. `None` if never initialized.
    fn load_identity(&self, domain: &str) -> Result<Option<ClientRecord>, StorageError>;

    /// Replace the stored token for `domain` in full.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no identity for `domain`
    fn replace_token(&self, domain: &str, sealed_token: &[u8]) -> Result<(), StorageError>;

    /// Erase the identity for `domain`. Idempotent.
    fn remove_identity(&self, domain: &str) -> Result<(), StorageError>;

    /// All domains with a stored identity, in ascending order.
    fn list_domains(&self) -> Result<Vec<String>, StorageError>;
}
