//! One client and one server joined by a [`SimLink`].
//!
//! `SimWorld` drives logical operations (a roll retried until a response
//! arrives) and extracts [`SystemSnapshot`]s by opening both sides' sealed
//! state with the shared test vault.

use oat_core::{
    ClientStore, KeyStore, MemoryClientStore, MemoryKeyStore, OatClient, OatError, OatServer,
    ServerConfig,
};
use oat_crypto::{ApiKey, SharedKey, Vault, VaultConfig, unwrap_api_key};
use oat_proto::{ClientId, SessionFields, Token};
use tracing::debug;

use crate::{
    SimEnv,
    invariants::{ClientSnapshot, OperationRecord, ServerSnapshot, SystemSnapshot},
    sim_link::{Fault, LinkEvent, SimLink},
};

/// Simulated deployment of one client against one server.
pub struct SimWorld {
    client: OatClient<SimEnv, MemoryClientStore>,
    link: SimLink,
    vault: Vault,
    operations: Vec<OperationRecord>,
}

impl SimWorld {
    /// Domain the simulated server answers for.
    pub const DOMAIN: &'static str = "sim.example";

    /// Vault password used by both sides.
    pub const PASSWORD: &'static str = "simulation vault password";

    /// Build a world whose randomness derives from `seed`.
    ///
    /// # Errors
    ///
    /// Never in practice; both configs are constants.
    pub fn new(seed: u64) -> Result<Self, OatError> {
        let env = SimEnv::with_seed(seed);
        let vault = Vault::new(&VaultConfig::new(Self::PASSWORD))?;
        let server = OatServer::new(
            env.clone(),
            MemoryKeyStore::new(),
            vault.clone(),
            ServerConfig::new(Self::DOMAIN)?,
        );
        let client = OatClient::new(env, MemoryClientStore::new(), vault.clone());

        Ok(Self { client, link: SimLink::new(server), vault, operations: Vec::new() })
    }

    /// Client engine.
    pub fn client(&self) -> &OatClient<SimEnv, MemoryClientStore> {
        &self.client
    }

    /// Server engine.
    pub fn server(&self) -> &OatServer<SimEnv, MemoryKeyStore> {
        self.link.server()
    }

    /// The link, for scheduling faults and reading events.
    pub fn link(&mut self) -> &mut SimLink {
        &mut self.link
    }

    /// Events recorded by the link.
    pub fn events(&self) -> &[LinkEvent] {
        self.link.events()
    }

    /// Run key exchange.
    pub fn init(&mut self) -> Result<ClientId, OatError> {
        self.client.init(Self::DOMAIN, &mut self.link)
    }

    /// One roll attempt with `fault` applied to the delivery.
    pub fn roll_once(&mut self, fault: Fault) -> Result<String, OatError> {
        self.link.schedule(fault);
        self.client.roll(Self::DOMAIN, &mut self.link)
    }

    /// Roll until a response arrives, consuming one fault per attempt.
    ///
    /// Attempts beyond `faults.len()` are delivered cleanly, so this always
    /// terminates unless the server rejects the client outright.
    pub fn roll_through(&mut self, faults: &[Fault]) -> Result<String, OatError> {
        let start = self.link.events().len();
        let mut attempts = faults.iter().copied().chain(std::iter::repeat(Fault::None));

        let result = loop {
            let fault = attempts.next().unwrap_or(Fault::None);
            match self.roll_once(fault) {
                Ok(token) => break Ok(token),
                Err(e) if e.is_retryable() && !self.last_event_rejected() => {
                    debug!(error = %e, "retrying roll");
                },
                Err(e) => break Err(e),
            }
        };

        let events = &self.link.events()[start..];
        self.operations.push(OperationRecord {
            commits: events.iter().filter(|e| matches!(e, LinkEvent::Rolled { valid: true, .. })).count(),
            resyncs: events.iter().filter(|e| matches!(e, LinkEvent::Rolled { valid: false, .. })).count(),
            completed: result.is_ok(),
        });
        result
    }

    /// Set fields for subsequent server responses.
    pub fn set_response_fields(&mut self, fields: SessionFields) {
        self.link.set_response_fields(fields);
    }

    /// Observable state of both sides.
    pub fn snapshot(&self) -> Result<SystemSnapshot, OatError> {
        let client = match self.client.store().load_identity(Self::DOMAIN)? {
            Some(record) => {
                let shared = SharedKey::from_bytes(*self.vault.open_key(&record.shared_key)?);
                let token = Token::decode_response(&self.client.token(Self::DOMAIN)?)?;
                let api_key = token
                    .header
                    .encrypted_api_key()
                    .map(|enc| unwrap_api_key(&shared, &enc.nonce, &enc.ciphertext));
                api_key.map(|api_key| ClientSnapshot { client_id: record.client_id, api_key })
            },
            None => None,
        };

        let store = self.server().store();
        let server_clients = store.list_clients()?;
        let mut servers = Vec::with_capacity(server_clients.len());
        for client_id in &server_clients {
            if let Some(record) = store.load_client(client_id)? {
                servers.push(ServerSnapshot {
                    client_id: *client_id,
                    current: ApiKey::from_bytes(*self.vault.open_key(&record.ratchet.current)?),
                    previous: ApiKey::from_bytes(*self.vault.open_key(&record.ratchet.previous)?),
                });
            }
        }

        Ok(SystemSnapshot { client, servers, operations: self.operations.clone() })
    }

    fn last_event_rejected(&self) -> bool {
        matches!(self.link.events().last(), Some(LinkEvent::Rejected { .. }))
    }
}
