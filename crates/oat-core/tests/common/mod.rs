//! Shared fixtures for engine tests.

#![allow(dead_code)]

use oat_core::{
    MemoryClientStore, MemoryKeyStore, OatClient, OatError, OatServer, ServerConfig, TransportError,
};
use oat_crypto::{Vault, VaultConfig};
use oat_harness::SimEnv;
use oat_proto::{InitRequest, SEPARATOR, SessionFields};

pub const DOMAIN: &str = "shop.example";
pub const PASSWORD: &str = "sixteen+ byte password";

pub type Server = OatServer<SimEnv, MemoryKeyStore>;
pub type Client = OatClient<SimEnv, MemoryClientStore>;

pub fn vault() -> Vault {
    Vault::new(&VaultConfig::new(PASSWORD)).unwrap()
}

pub fn deployment(seed: u64) -> (Server, Client) {
    let env = SimEnv::with_seed(seed);
    let server = OatServer::new(env.clone(), MemoryKeyStore::new(), vault(), ServerConfig::new(DOMAIN).unwrap());
    let client = OatClient::new(env, MemoryClientStore::new(), vault());
    (server, client)
}

/// Route a request the way an embedding application would.
pub fn handle(server: &Server, request: &str, fields: &SessionFields) -> Result<String, OatError> {
    if request.contains(SEPARATOR) {
        Ok(server.roll(request, fields)?.token)
    } else {
        Ok(server.init(&InitRequest::decode(request)?, fields)?.token)
    }
}

/// Transport that answers from `server` with `fields`.
pub fn direct<'a>(
    server: &'a Server,
    fields: SessionFields,
) -> impl FnMut(&str) -> Result<String, TransportError> + 'a {
    move |request| handle(server, request, &fields).map_err(|e| TransportError(e.to_string()))
}

pub fn init(server: &Server, client: &Client) {
    client.init(DOMAIN, &mut direct(server, SessionFields::new())).unwrap();
}
