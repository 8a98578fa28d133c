//! OAT Cryptographic Primitives
//!
//! Cryptographic building blocks for OAT. Pure functions with deterministic
//! outputs. Callers provide random bytes (nonces, seeds) so that engines can
//! be driven by a seeded RNG in tests.
//!
//! # Key Lifecycle
//!
//! ```text
//! vault password ──SHA3-256──► master key ──HMAC(label)──► session MAC key
//!                                   │                      issuance key
//!                                   ▼
//!                          AES-256-GCM seal of every persisted secret
//!
//! X25519(own, peer) ──► shared key ──SHA-1──► client id
//!                           │
//!                           ▼
//!              AES-256-GCM keystream wraps each api key
//!
//! HMAC(issuance key, random) ──► api key[0]
//! HMAC(api key[n], random)   ──► api key[n+1]
//! ```
//!
//! # Security
//!
//! Ratchet:
//! - Each api key is a keyed hash of its predecessor, so computing a
//!   successor requires possession of the current key
//! - Fresh randomness per step makes successive keys unpredictable even to a
//!   holder of an older generation
//!
//! Authenticity:
//! - Ed25519 binds `(api_key, domain)` to the client's registered key
//! - The footer HMAC binds `(client_id, fields, api_key)` under a server-only
//!   key, so clients cannot forge session fields
//! - Key comparisons are constant time
//!
//! At rest:
//! - Every persisted secret is sealed with a fresh 96-bit nonce
//! - AEAD failures are reported without sub-reasons

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod error;
pub mod exchange;
pub mod keys;
pub mod ratchet;
pub mod session;
pub mod signature;
pub mod vault;

pub use aead::{NONCE_SIZE, TAG_SIZE, open, seal, unwrap_api_key, wrap_api_key};
pub use ed25519_dalek::{SigningKey, VerifyingKey};
pub use error::{ConfigError, CryptoError};
pub use exchange::{BoxKeyPair, derive_client_id};
pub use keys::{ApiKey, SharedKey};
pub use ratchet::{ISSUANCE_LABEL, issue_api_key, next_api_key};
pub use session::{SESSION_MAC_LABEL, session_mac, verify_session_mac};
pub use signature::{SignedApiKey, open_signed_api_key, sign_api_key, verifying_key_from_bytes};
pub use vault::{MasterKey, Vault, VaultConfig, derive_master_key};
