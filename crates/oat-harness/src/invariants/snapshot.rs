//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the opened key material of both sides at a point in
//! time. Invariants operate on snapshots rather than live state so a check
//! never races with a roll.

use oat_crypto::ApiKey;
use oat_proto::ClientId;

/// Snapshot of the whole simulated deployment.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Client's identity and held api key. `None` before init or after
    /// deinit.
    pub client: Option<ClientSnapshot>,
    /// Server ratchet state per client id.
    pub servers: Vec<ServerSnapshot>,
    /// Logical roll operations so far, oldest first.
    pub operations: Vec<OperationRecord>,
}

impl SystemSnapshot {
    /// Create an empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Server state for `client_id`.
    pub fn server_for(&self, client_id: &ClientId) -> Option<&ServerSnapshot> {
        self.servers.iter().find(|s| s.client_id == *client_id)
    }
}

/// Client-side state.
#[derive(Debug, Clone)]
pub struct ClientSnapshot {
    /// Id the client stored at init
    pub client_id: ClientId,
    /// Api key recovered from the client's stored token
    pub api_key: ApiKey,
}

/// Server-side ratchet for one client.
#[derive(Debug, Clone)]
pub struct ServerSnapshot {
    /// Client the ratchet belongs to
    pub client_id: ClientId,
    /// Current generation
    pub current: ApiKey,
    /// Previous generation
    pub previous: ApiKey,
}

/// One logical roll: a request retried until a response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationRecord {
    /// Server rolls reported `valid = true`
    pub commits: usize,
    /// Server rolls reported `valid = false`
    pub resyncs: usize,
    /// Whether the client finally received a response
    pub completed: bool,
}
