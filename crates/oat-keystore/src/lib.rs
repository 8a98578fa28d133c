//! Durable OAT deployments.
//!
//! Production glue around [`oat_core`]'s engines: a redb-backed store, the
//! OS-randomness [`SystemEnv`], and configuration loaded from the process
//! environment. The `oat-keys` binary in this crate administers a server
//! database (listing, checking, and removing clients).
//!
//! # Components
//!
//! - [`RedbStore`]: crash-safe [`KeyStore`](oat_core::KeyStore) and
//!   [`ClientStore`](oat_core::ClientStore)
//! - [`ChaoticStore`]: fault-injecting wrapper for chaos tests
//! - [`SystemEnv`]: production environment (crypto RNG)
//! - [`KeystoreConfig`]: `OAT_*` environment variables

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod error;
pub mod storage;
mod system_env;

pub use config::KeystoreConfig;
pub use error::KeystoreError;
use oat_core::{OatClient, OatServer};
pub use storage::{ChaoticStore, FailurePoint, RedbStore};
pub use system_env::SystemEnv;

/// Server engine over a redb database.
pub type DurableServer = OatServer<SystemEnv, RedbStore>;

/// Client engine over a redb database.
pub type DurableClient = OatClient<SystemEnv, RedbStore>;

/// Open the configured database and build a server engine on it.
///
/// # Errors
///
/// - `Config`: no domain configured
/// - `Oat`: the database cannot be opened
pub fn open_server(config: &KeystoreConfig) -> Result<DurableServer, KeystoreError> {
    let server_config = config.server_config()?;
    let store = RedbStore::open(&config.db_path)?;
    tracing::info!(db = %config.db_path.display(), domain = server_config.domain(), "opened server keystore");
    Ok(OatServer::new(SystemEnv::new(), store, config.vault()?, server_config))
}

/// Open the configured database and build a client engine on it.
pub fn open_client(config: &KeystoreConfig) -> Result<DurableClient, KeystoreError> {
    let store = RedbStore::open(&config.db_path)?;
    tracing::info!(db = %config.db_path.display(), "opened client keystore");
    Ok(OatClient::new(SystemEnv::new(), store, config.vault()?))
}
