#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use oat_proto::ClientId;

use super::{ClientRecord, ClientStore, KeyRecord, KeyStore, SealedRatchet, StorageError};

/// In-memory server key store for testing and simulation
///
/// `BTreeMap` keeps `list_clients` ordered without a sort. All state is
/// wrapped in `Arc<Mutex<>>` to allow Clone and concurrent access; the
/// ratchet compare-and-swap holds the lock across compare and write. Uses
/// `lock().expect()`, which panics if the mutex is poisoned - acceptable for
/// test code.
#[derive(Clone, Default)]
pub struct MemoryKeyStore {
    inner: Arc<Mutex<BTreeMap<ClientId, KeyRecord>>>,
}

impl MemoryKeyStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored clients.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn client_count(&self) -> usize {
        self.inner.lock().expect("Mutex poisoned").len()
    }
}

impl KeyStore for MemoryKeyStore {
    #[allow(clippy::expect_used)]
    fn insert_client(&self, client_id: &ClientId, record: &KeyRecord) -> Result<(), StorageError> {
        self.inner.lock().expect("Mutex poisoned").insert(*client_id, record.clone());
        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn load_client(&self, client_id: &ClientId) -> Result<Option<KeyRecord>, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").get(client_id).cloned())
    }

    #[allow(clippy::expect_used)]
    fn swap_ratchet(
        &self,
        client_id: &ClientId,
        expected: &SealedRatchet,
        next: &SealedRatchet,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let record = inner
            .get_mut(client_id)
            .ok_or_else(|| StorageError::NotFound { key: client_id.to_hex() })?;

        if record.ratchet != *expected {
            return Err(StorageError::Conflict { client_id: client_id.to_hex() });
        }

        record.ratchet = next.clone();
        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn remove_client(&self, client_id: &ClientId) -> Result<(), StorageError> {
        self.inner.lock().expect("Mutex poisoned").remove(client_id);
        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn list_clients(&self) -> Result<Vec<ClientId>, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").keys().copied().collect())
    }
}

/// In-memory client identity store for testing and simulation
///
/// Same locking behavior as [`MemoryKeyStore`].
#[derive(Clone, Default)]
pub struct MemoryClientStore {
    inner: Arc<Mutex<BTreeMap<String, ClientRecord>>>,
}

impl MemoryClientStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStore for MemoryClientStore {
    #[allow(clippy::expect_used)]
    fn store_identity(&self, domain: &str, record: &ClientRecord) -> Result<(), StorageError> {
        self.inner.lock().expect("Mutex poisoned").insert(domain.to_owned(), record.clone());
        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn load_identity(&self, domain: &str) -> Result<Option<ClientRecord>, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").get(domain).cloned())
    }

    #[allow(clippy::expect_used)]
    fn replace_token(&self, domain: &str, sealed_token: &[u8]) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        let record = inner
            .get_mut(domain)
            .ok_or_else(|| StorageError::NotFound { key: domain.to_owned() })?;
        record.token = sealed_token.to_vec();
        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn remove_identity(&self, domain: &str) -> Result<(), StorageError> {
        self.inner.lock().expect("Mutex poisoned").remove(domain);
        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn list_domains(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").keys().cloned().collect())
    }
}
