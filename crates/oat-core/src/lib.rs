//! OAT protocol engines.
//!
//! Sans-IO implementations of both protocol roles. Engines are generic over
//! an [`Environment`] (randomness) and a storage trait; they never open
//! sockets or files. The embedding application supplies a [`Transport`] on
//! the client side and decides how tokens travel (typically one HTTP header).
//!
//! # Flow
//!
//! ```text
//! Client                                      Server
//!   │ init request: box_pub ‖ sign_pub          │
//!   │──────────────────────────────────────────►│ X25519, client id, api key[0]
//!   │◄──────────────────────────────────────────│ init response
//!   │ X25519, verify client id                  │
//!   │                                           │
//!   │ roll request: sign(api key[n] ‖ domain)   │
//!   │──────────────────────────────────────────►│ authenticate, ratchet
//!   │◄──────────────────────────────────────────│ roll response: api key[n+1]
//! ```
//!
//! # Resync
//!
//! The server keeps the current and the previous api key. A client that lost
//! one response still holds the previous key; its next roll is accepted with
//! `valid = false` and only the current slot is replaced. A key older than
//! that is a [`OatError::TokenMismatch`], and the client must re-initialize.
//!
//! # Concurrency
//!
//! Ratchet updates go through [`KeyStore::swap_ratchet`]. Two rolls racing on
//! one client id cannot both commit; the loser sees
//! [`StorageError::Conflict`], which [`OatError::is_retryable`] reports as
//! retryable.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod auth;
pub mod client;
pub mod config;
pub mod env;
pub mod error;
pub mod server;
pub mod storage;
pub mod transport;

pub use auth::{ClientAuthResult, Generation, VerifiedRequest, authenticate, verify_request};
pub use client::OatClient;
pub use config::ServerConfig;
pub use env::Environment;
pub use error::{AuthError, OatError, TransportError};
pub use server::{Issued, IssuedChallenge, OatServer, RollOutcome};
pub use storage::{
    ClientRecord, ClientStore, KeyRecord, KeyStore, MemoryClientStore, MemoryKeyStore,
    SealedRatchet, StorageError,
};
pub use transport::Transport;
