//! Redb-backed durable storage implementation.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. A
//! ratchet swap that returns `Ok` has committed; one that fails or is
//! interrupted leaves the previous record in place.

use std::{path::Path, sync::Arc};

use oat_core::{ClientRecord, ClientStore, KeyRecord, KeyStore, SealedRatchet, StorageError};
use oat_proto::ClientId;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Serialize, de::DeserializeOwned};

/// Table: clients
/// Key: client id [20 bytes]
/// Value: CBOR-encoded KeyRecord
const CLIENTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("clients");

/// Table: identities
/// Key: server domain
/// Value: CBOR-encoded ClientRecord
const IDENTITIES: TableDefinition<&str, &[u8]> = TableDefinition::new("identities");

/// Durable storage backed by Redb.
///
/// One database can serve both roles: the server tables are keyed by client
/// id, the client tables by domain. Thread-safe through Redb's internal
/// locking; write transactions are serialized, which is what makes
/// `swap_ratchet` atomic. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates tables if they don't exist (CLIENTS, IDENTITIES).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(io)?;

        let txn = db.begin_write().map_err(io)?;
        {
            let _ = txn.open_table(CLIENTS).map_err(io)?;
            let _ = txn.open_table(IDENTITIES).map_err(io)?;
        }
        txn.commit().map_err(io)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl KeyStore for RedbStore {
    fn insert_client(&self, client_id: &ClientId, record: &KeyRecord) -> Result<(), StorageError> {
        let bytes = encode(record)?;
        let txn = self.db.begin_write().map_err(io)?;
        {
            let mut table = txn.open_table(CLIENTS).map_err(io)?;
            table.insert(client_id.as_bytes().as_slice(), bytes.as_slice()).map_err(io)?;
        }
        txn.commit().map_err(io)?;

        Ok(())
    }

    fn load_client(&self, client_id: &ClientId) -> Result<Option<KeyRecord>, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let table = txn.open_table(CLIENTS).map_err(io)?;

        match table.get(client_id.as_bytes().as_slice()).map_err(io)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    fn swap_ratchet(
        &self,
        client_id: &ClientId,
        expected: &SealedRatchet,
        next: &SealedRatchet,
    ) -> Result<(), StorageError> {
        let key = client_id.as_bytes().as_slice();
        let txn = self.db.begin_write().map_err(io)?;
        {
            let mut table = txn.open_table(CLIENTS).map_err(io)?;

            let stored = table.get(key).map_err(io)?.map(|value| decode::<KeyRecord>(value.value()));
            let Some(mut record) = stored.transpose()? else {
                return Err(StorageError::NotFound { key: client_id.to_hex() });
            };

            // Dropping the uncommitted transaction discards it
            if record.ratchet != *expected {
                return Err(StorageError::Conflict { client_id: client_id.to_hex() });
            }

            record.ratchet = next.clone();
            table.insert(key, encode(&record)?.as_slice()).map_err(io)?;
        }
        txn.commit().map_err(io)?;

        Ok(())
    }

    fn remove_client(&self, client_id: &ClientId) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(io)?;
        {
            let mut table = txn.open_table(CLIENTS).map_err(io)?;
            table.remove(client_id.as_bytes().as_slice()).map_err(io)?;
        }
        txn.commit().map_err(io)?;

        Ok(())
    }

    fn list_clients(&self) -> Result<Vec<ClientId>, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let table = txn.open_table(CLIENTS).map_err(io)?;

        let mut clients = Vec::new();
        for result in table.iter().map_err(io)? {
            let (key, _) = result.map_err(io)?;
            let client_id = ClientId::from_slice(key.value())
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            clients.push(client_id);
        }

        Ok(clients)
    }
}

impl ClientStore for RedbStore {
    fn store_identity(&self, domain: &str, record: &ClientRecord) -> Result<(), StorageError> {
        let bytes = encode(record)?;
        let txn = self.db.begin_write().map_err(io)?;
        {
            let mut table = txn.open_table(IDENTITIES).map_err(io)?;
            table.insert(domain, bytes.as_slice()).map_err(io)?;
        }
        txn.commit().map_err(io)?;

        Ok(())
    }

    fn load_identity(&self, domain: &str) -> Result<Option<ClientRecord>, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let table = txn.open_table(IDENTITIES).map_err(io)?;

        match table.get(domain).map_err(io)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    fn replace_token(&self, domain: &str, sealed_token: &[u8]) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(io)?;
        {
            let mut table = txn.open_table(IDENTITIES).map_err(io)?;

            let stored = table.get(domain).map_err(io)?.map(|value| decode::<ClientRecord>(value.value()));
            let Some(mut record) = stored.transpose()? else {
                return Err(StorageError::NotFound { key: domain.to_string() });
            };

            record.token = sealed_token.to_vec();
            table.insert(domain, encode(&record)?.as_slice()).map_err(io)?;
        }
        txn.commit().map_err(io)?;

        Ok(())
    }

    fn remove_identity(&self, domain: &str) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(io)?;
        {
            let mut table = txn.open_table(IDENTITIES).map_err(io)?;
            table.remove(domain).map_err(io)?;
        }
        txn.commit().map_err(io)?;

        Ok(())
    }

    fn list_domains(&self) -> Result<Vec<String>, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let table = txn.open_table(IDENTITIES).map_err(io)?;

        let mut domains = Vec::new();
        for result in table.iter().map_err(io)? {
            let (key, _) = result.map_err(io)?;
            domains.push(key.value().to_string());
        }

        Ok(domains)
    }
}

fn io(err: impl std::fmt::Display) -> StorageError {
    StorageError::Io(err.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes).map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(bytes)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    ciborium::from_reader(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}
