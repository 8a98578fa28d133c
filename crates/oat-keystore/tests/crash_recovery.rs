//! Crash recovery tests for `RedbStore`.
//!
//! These tests verify that key material persists across database
//! close/reopen cycles, simulating server and client restarts in the middle
//! of a token chain.

mod common;

use common::{DOMAIN, client, direct, server};
use oat_core::{KeyStore, OatError};
use oat_harness::SimEnv;
use oat_keystore::{KeystoreConfig, RedbStore, open_client, open_server};
use oat_proto::SessionFields;
use tempfile::tempdir;

#[test]
fn test_token_chain_survives_restart() {
    let dir = tempdir().unwrap();
    let server_db = dir.path().join("server.redb");
    let client_db = dir.path().join("client.redb");
    let env = SimEnv::with_seed(1);

    let client_id = {
        let server = server(env.clone(), RedbStore::open(&server_db).unwrap());
        let client = client(env.clone(), RedbStore::open(&client_db).unwrap());

        let client_id = client.init(DOMAIN, &mut direct(&server)).unwrap();
        for _ in 0..3 {
            client.roll(DOMAIN, &mut direct(&server)).unwrap();
        }
        client_id

        // Databases dropped
    };

    let server = server(env.clone(), RedbStore::open(&server_db).unwrap());
    let client = client(env, RedbStore::open(&client_db).unwrap());

    assert_eq!(server.list_clients().unwrap(), vec![client_id]);
    assert_eq!(client.list_domains().unwrap(), vec![DOMAIN.to_string()]);
    assert_eq!(client.client_id(DOMAIN).unwrap(), client_id);

    let outcome = server.roll(&client.roll_request(DOMAIN).unwrap(), &SessionFields::new()).unwrap();
    assert!(outcome.valid);
}

#[test]
fn test_resync_after_lost_response_and_restart() {
    let dir = tempdir().unwrap();
    let server_db = dir.path().join("server.redb");
    let client_db = dir.path().join("client.redb");
    let env = SimEnv::with_seed(2);

    {
        let server = server(env.clone(), RedbStore::open(&server_db).unwrap());
        let client = client(env.clone(), RedbStore::open(&client_db).unwrap());
        client.init(DOMAIN, &mut direct(&server)).unwrap();

        // Server commits, the response never reaches the client
        let request = client.roll_request(DOMAIN).unwrap();
        assert!(server.roll(&request, &SessionFields::new()).unwrap().valid);
    }

    let server = server(env.clone(), RedbStore::open(&server_db).unwrap());
    let client = client(env, RedbStore::open(&client_db).unwrap());

    let resync = server.roll(&client.roll_request(DOMAIN).unwrap(), &SessionFields::new()).unwrap();
    assert!(!resync.valid);

    // Still one generation behind, so this resyncs again and is delivered
    client.roll(DOMAIN, &mut direct(&server)).unwrap();
    let outcome = server.roll(&client.roll_request(DOMAIN).unwrap(), &SessionFields::new()).unwrap();
    assert!(outcome.valid);
}

#[test]
fn test_deinit_survives_restart() {
    let dir = tempdir().unwrap();
    let server_db = dir.path().join("server.redb");
    let env = SimEnv::with_seed(3);
    let client = client(env.clone(), oat_core::MemoryClientStore::new());

    let client_id = {
        let server = server(env.clone(), RedbStore::open(&server_db).unwrap());
        let client_id = client.init(DOMAIN, &mut direct(&server)).unwrap();
        server.deinit(&client_id).unwrap();
        client_id
    };

    let server = server(env, RedbStore::open(&server_db).unwrap());
    assert!(server.list_clients().unwrap().is_empty());
    assert_eq!(
        server.roll(&client.roll_request(DOMAIN).unwrap(), &SessionFields::new()).unwrap_err(),
        OatError::UnknownClient(client_id)
    );
}

#[test]
fn test_records_hold_no_plaintext_keys() {
    let dir = tempdir().unwrap();
    let store = RedbStore::open(dir.path().join("server.redb")).unwrap();
    let env = SimEnv::with_seed(4);
    let server = server(env.clone(), store.clone());
    let client = client(env, oat_core::MemoryClientStore::new());

    let client_id = client.init(DOMAIN, &mut direct(&server)).unwrap();
    let record = store.load_client(&client_id).unwrap().unwrap();

    // nonce(12) + key(32) + tag(16)
    for sealed in [&record.shared_key, &record.verifying_key, &record.ratchet.current, &record.ratchet.previous] {
        assert_eq!(sealed.len(), 60);
    }
    server.check_client(&client_id).unwrap();
}

#[test]
fn test_durable_deployment_from_config() {
    let dir = tempdir().unwrap();
    let server_db = dir.path().join("server.redb").to_string_lossy().into_owned();
    let client_db = dir.path().join("client.redb").to_string_lossy().into_owned();

    let server_config = KeystoreConfig::from_lookup(|name| match name {
        "OAT_PASS" => Some(common::PASSWORD.into()),
        "OAT_DB" => Some(server_db.clone()),
        "OAT_DOMAIN" => Some(DOMAIN.into()),
        _ => None,
    })
    .unwrap();
    let client_config = KeystoreConfig::from_lookup(|name| match name {
        "OAT_PASS" => Some(common::PASSWORD.into()),
        "OAT_DB" => Some(client_db.clone()),
        _ => None,
    })
    .unwrap();

    let server = open_server(&server_config).unwrap();
    let client = open_client(&client_config).unwrap();

    let client_id = client.init(DOMAIN, &mut direct(&server)).unwrap();
    client.roll(DOMAIN, &mut direct(&server)).unwrap();
    server.check_client(&client_id).unwrap();

    // A client-only config has no domain to serve
    assert!(matches!(open_server(&client_config), Err(oat_keystore::KeystoreError::Config(_))));
}

#[test]
fn test_wrong_password_cannot_open_records() {
    let dir = tempdir().unwrap();
    let server_db = dir.path().join("server.redb");
    let env = SimEnv::with_seed(5);
    let client = client(env.clone(), oat_core::MemoryClientStore::new());

    let client_id = {
        let server = server(env.clone(), RedbStore::open(&server_db).unwrap());
        client.init(DOMAIN, &mut direct(&server)).unwrap()
    };

    let other = oat_crypto::Vault::new(&oat_crypto::VaultConfig::new("not the password it was")).unwrap();
    let server = oat_core::OatServer::new(
        env,
        RedbStore::open(&server_db).unwrap(),
        other,
        oat_core::ServerConfig::new(DOMAIN).unwrap(),
    );
    assert!(matches!(server.check_client(&client_id), Err(OatError::Crypto(_))));
}
