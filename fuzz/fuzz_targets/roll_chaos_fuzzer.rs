//! Fuzz target for the roll ratchet under message loss and storage failures
//!
//! Drives one client and one server through an arbitrary schedule of rolls,
//! lost requests, lost responses, and reads, with the server's key store
//! wrapped in `ChaoticStore`.
//!
//! # Invariants
//!
//! - Engines NEVER panic on storage errors
//! - The client's stored token always authenticates against the reliable
//!   view of the server store (no schedule strands the client)
//! - Only the request carrying the current generation reports `valid`

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use oat_core::{
    Generation, MemoryClientStore, MemoryKeyStore, OatClient, OatServer, ServerConfig,
    TransportError,
};
use oat_crypto::{Vault, VaultConfig};
use oat_harness::SimEnv;
use oat_keystore::{ChaoticStore, FailurePoint};
use oat_proto::{InitRequest, SessionFields, SEPARATOR};

const DOMAIN: &str = "fuzz.example";
const PASSWORD: &str = "fuzzing vault password";

#[derive(Debug, Clone, Arbitrary)]
struct RollScenario {
    /// Seed for the simulation RNG
    seed: u64,
    /// Seed for ChaoticStore RNG (deterministic failures)
    chaos_seed: u64,
    /// Failure rate 0-9 maps to 0%-90%
    failure_rate_tenth: u8,
    /// Failed writes still commit
    lose_acks: bool,
    operations: Vec<RollOperation>,
}

#[derive(Debug, Clone, Arbitrary)]
enum RollOperation {
    /// Full roll through the chaotic server
    Roll,
    /// The request never reaches the server
    LoseRequest,
    /// The server commits but the response never arrives
    LoseResponse,
    /// Authenticate without advancing
    Authenticate,
}

fuzz_target!(|scenario: RollScenario| {
    let Ok(vault) = Vault::new(&VaultConfig::new(PASSWORD)) else { return };
    let Ok(config) = ServerConfig::new(DOMAIN) else { return };

    let env = SimEnv::with_seed(scenario.seed);
    let key_store = MemoryKeyStore::new();
    let reliable = OatServer::new(env.clone(), key_store.clone(), vault.clone(), config.clone());

    let failure_rate = f64::from(scenario.failure_rate_tenth % 10) / 10.0;
    let point =
        if scenario.lose_acks { FailurePoint::AfterWrite } else { FailurePoint::BeforeWrite };
    let chaotic = OatServer::new(
        env.clone(),
        ChaoticStore::with_seed(key_store, failure_rate, scenario.chaos_seed)
            .with_failure_point(point),
        vault.clone(),
        config,
    );

    let client = OatClient::new(env, MemoryClientStore::new(), vault);
    let mut init = |request: &str| -> Result<String, TransportError> {
        let request = InitRequest::decode(request).map_err(|e| TransportError(e.to_string()))?;
        reliable
            .init(&request, &SessionFields::new())
            .map(|issued| issued.token)
            .map_err(|e| TransportError(e.to_string()))
    };
    let Ok(client_id) = client.init(DOMAIN, &mut init) else { return };

    for operation in scenario.operations.iter().take(64) {
        match operation {
            RollOperation::Roll => {
                let mut send = |request: &str| -> Result<String, TransportError> {
                    assert!(request.contains(SEPARATOR));
                    chaotic
                        .roll(request, &SessionFields::new())
                        .map(|outcome| outcome.token)
                        .map_err(|e| TransportError(e.to_string()))
                };
                let _ = client.roll(DOMAIN, &mut send);
            },
            RollOperation::LoseRequest => {
                let mut lost = |_: &str| -> Result<String, TransportError> {
                    Err(TransportError("request lost".into()))
                };
                assert!(client.roll(DOMAIN, &mut lost).is_err());
            },
            RollOperation::LoseResponse => {
                let Ok(request) = client.roll_request(DOMAIN) else { continue };
                let Ok(auth) = reliable.authenticate(&request) else { continue };
                if let Ok(outcome) = chaotic.roll(&request, &SessionFields::new()) {
                    assert_eq!(outcome.valid, auth.generation == Generation::Current);
                }
            },
            RollOperation::Authenticate => {
                if let Ok(request) = client.roll_request(DOMAIN) {
                    let _ = chaotic.authenticate(&request);
                }
            },
        }

        let Ok(request) = client.roll_request(DOMAIN) else {
            unreachable!("client store is reliable");
        };
        let auth = reliable.authenticate(&request);
        assert!(auth.is_ok(), "client stranded: {auth:?}");
        assert_eq!(auth.ok().map(|a| a.client_id), Some(client_id));
    }
});
