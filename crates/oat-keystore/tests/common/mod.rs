//! Shared fixtures for keystore tests.

#![allow(dead_code)]

use oat_core::{
    ClientStore, Environment, KeyStore, OatClient, OatError, OatServer, ServerConfig, TransportError,
};
use oat_crypto::{Vault, VaultConfig};
use oat_proto::{InitRequest, SEPARATOR, SessionFields};

pub const DOMAIN: &str = "vault.example";
pub const PASSWORD: &str = "correct horse battery staple";

pub fn vault() -> Vault {
    Vault::new(&VaultConfig::new(PASSWORD)).unwrap()
}

pub fn server<E: Environment, S: KeyStore>(env: E, store: S) -> OatServer<E, S> {
    OatServer::new(env, store, vault(), ServerConfig::new(DOMAIN).unwrap())
}

pub fn client<E: Environment, C: ClientStore>(env: E, store: C) -> OatClient<E, C> {
    OatClient::new(env, store, vault())
}

/// Transport that answers from `server` with empty session fields.
pub fn direct<'a, E: Environment, S: KeyStore>(
    server: &'a OatServer<E, S>,
) -> impl FnMut(&str) -> Result<String, TransportError> + 'a {
    move |request| handle(server, request).map_err(|e| TransportError(e.to_string()))
}

fn handle<E: Environment, S: KeyStore>(server: &OatServer<E, S>, request: &str) -> Result<String, OatError> {
    let fields = SessionFields::new();
    if request.contains(SEPARATOR) {
        Ok(server.roll(request, &fields)?.token)
    } else {
        Ok(server.init(&InitRequest::decode(request)?, &fields)?.token)
    }
}
