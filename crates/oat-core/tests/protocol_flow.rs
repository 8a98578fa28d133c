//! End-to-end protocol behavior between an `OatClient` and an `OatServer`.

mod common;

use common::{DOMAIN, deployment, direct, init};
use oat_core::{AuthError, ClientStore, Generation, OatError, TransportError};
use oat_proto::{ProtocolError, SessionFields, session_data};
use serde_json::json;

fn fields(value: serde_json::Value) -> SessionFields {
    SessionFields::try_from(value).unwrap()
}

#[test]
fn init_roll_roll_replay() {
    let (server, client) = deployment(1);

    let client_id = client.init(DOMAIN, &mut direct(&server, SessionFields::new())).unwrap();
    assert_eq!(server.list_clients().unwrap(), vec![client_id]);

    // Signatures are deterministic, so this is exactly what roll() sends
    let first_request = client.roll_request(DOMAIN).unwrap();
    client.roll(DOMAIN, &mut direct(&server, SessionFields::new())).unwrap();

    let cart = fields(json!({"cart": {"apple": 2}}));
    let second = client.roll(DOMAIN, &mut direct(&server, cart.clone())).unwrap();
    assert_eq!(session_data(&second).unwrap(), cart);
    assert_eq!(client.session_data(DOMAIN).unwrap(), cart);

    // The first request carried the init key, two generations stale by now
    assert_eq!(
        server.roll(&first_request, &SessionFields::new()).unwrap_err(),
        OatError::TokenMismatch(client_id)
    );
}

#[test]
fn request_fields_are_returned_verified() {
    let (server, client) = deployment(2);
    client.init(DOMAIN, &mut direct(&server, fields(json!({"user": 7})))).unwrap();

    let request = client.roll_request(DOMAIN).unwrap();
    let outcome = server.roll(&request, &SessionFields::new()).unwrap();
    assert_eq!(outcome.fields, fields(json!({"user": 7})));
}

#[test]
fn float_fields_keep_authenticating() {
    let (server, client) = deployment(13);
    init(&server, &client);

    // serde_json without float_roundtrip reads this back as ...807
    let priced = fields(json!({"price": 989.859_794_120_780_9, "total": 0.1, "id": u64::MAX}));
    client.roll(DOMAIN, &mut direct(&server, priced.clone())).unwrap();
    client.roll(DOMAIN, &mut direct(&server, priced.clone())).unwrap();
    assert_eq!(client.session_data(DOMAIN).unwrap(), priced);

    let outcome = server.roll(&client.roll_request(DOMAIN).unwrap(), &SessionFields::new()).unwrap();
    assert!(outcome.valid);
    assert_eq!(outcome.fields, priced);
}

#[test]
fn roll_rejects_init_shaped_reply() {
    let (server, client) = deployment(14);
    init(&server, &client);
    let init_token = client.token(DOMAIN).unwrap();
    client.roll(DOMAIN, &mut direct(&server, SessionFields::new())).unwrap();
    let rolled = client.token(DOMAIN).unwrap();

    // Same client id in the footer, but a 76-byte header
    let mut replay = |_: &str| -> Result<String, TransportError> { Ok(init_token.clone()) };
    assert!(matches!(
        client.roll(DOMAIN, &mut replay),
        Err(OatError::MalformedToken(ProtocolError::InvalidLength { expected: 44, actual: 76, .. }))
    ));
    assert_eq!(client.token(DOMAIN).unwrap(), rolled);
}

#[test]
fn one_generation_resync() {
    let (server, client) = deployment(3);
    init(&server, &client);

    let k0 = client.roll_request(DOMAIN).unwrap();
    client.roll(DOMAIN, &mut direct(&server, SessionFields::new())).unwrap();

    // Server advances to K2 but the response is lost
    let k1 = client.roll_request(DOMAIN).unwrap();
    assert!(server.roll(&k1, &SessionFields::new()).unwrap().valid);

    assert_eq!(server.authenticate(&k1).unwrap().generation, Generation::Previous);
    let resync = server.roll(&k1, &SessionFields::new()).unwrap();
    assert!(!resync.valid);

    // Resync does not move the previous slot, so K1 is still accepted once more
    assert!(!server.roll(&k1, &SessionFields::new()).unwrap().valid);
    assert!(matches!(server.roll(&k0, &SessionFields::new()), Err(OatError::TokenMismatch(_))));
}

#[test]
fn client_recovers_after_lost_response() {
    let (server, client) = deployment(4);
    init(&server, &client);

    let mut lossy = |request: &str| -> Result<String, TransportError> {
        let _ = server.roll(request, &SessionFields::new());
        Err(TransportError("response lost".into()))
    };
    assert!(client.roll(DOMAIN, &mut lossy).unwrap_err().is_retryable());

    let token = client.roll(DOMAIN, &mut direct(&server, SessionFields::new())).unwrap();
    let next = client.roll_request(DOMAIN).unwrap();
    assert_eq!(server.authenticate(&next).unwrap().generation, Generation::Current);
    assert_eq!(client.token(DOMAIN).unwrap(), token);
}

#[test]
fn authenticate_does_not_advance() {
    let (server, client) = deployment(5);
    init(&server, &client);

    let request = client.roll_request(DOMAIN).unwrap();
    for _ in 0..3 {
        assert_eq!(server.authenticate(&request).unwrap().generation, Generation::Current);
    }
    assert!(server.roll(&request, &SessionFields::new()).unwrap().valid);
}

#[test]
fn wrong_domain_is_rejected() {
    let (server, client) = deployment(6);
    // The client believes it is talking to another deployment
    client.init("evil.example", &mut direct(&server, SessionFields::new())).unwrap();

    let request = client.roll_request("evil.example").unwrap();
    assert_eq!(
        server.roll(&request, &SessionFields::new()).unwrap_err(),
        OatError::Auth(AuthError::DomainMismatch)
    );
}

#[test]
fn unknown_client_requires_reinit() {
    let (server, client) = deployment(7);
    let client_id = client.init(DOMAIN, &mut direct(&server, SessionFields::new())).unwrap();
    server.deinit(&client_id).unwrap();
    server.deinit(&client_id).unwrap();

    let err = server.roll(&client.roll_request(DOMAIN).unwrap(), &SessionFields::new()).unwrap_err();
    assert_eq!(err, OatError::UnknownClient(client_id));
    assert!(err.requires_reinit());
}

#[test]
fn check_client_needs_the_sealing_password() {
    let (server, client) = deployment(12);
    let client_id = client.init(DOMAIN, &mut direct(&server, SessionFields::new())).unwrap();
    server.check_client(&client_id).unwrap();

    let other = oat_crypto::Vault::new(&oat_crypto::VaultConfig::new("a different long password")).unwrap();
    let foreign = oat_core::OatServer::new(
        harness_env(),
        server.store().clone(),
        other,
        oat_core::ServerConfig::new(DOMAIN).unwrap(),
    );
    assert!(matches!(foreign.check_client(&client_id), Err(OatError::Crypto(_))));
}

#[test]
fn client_deinit_is_idempotent() {
    let (server, client) = deployment(8);
    init(&server, &client);

    client.deinit(DOMAIN).unwrap();
    client.deinit(DOMAIN).unwrap();
    assert_eq!(client.roll_request(DOMAIN).unwrap_err(), OatError::UnknownDomain(DOMAIN.into()));
}

#[test]
fn set_session_data_reissues_footer() {
    let (server, client) = deployment(9);
    init(&server, &client);

    let request = client.roll_request(DOMAIN).unwrap();
    let outcome = server.roll(&request, &SessionFields::new()).unwrap();

    let updated = fields(json!({"cart": {"pear": 1}}));
    let reissued = server.set_session_data(&outcome.token, &updated).unwrap();
    assert_eq!(session_data(&reissued).unwrap(), updated);

    client.store().replace_token(DOMAIN, &vault_seal(&reissued)).unwrap();
    let next = server.roll(&client.roll_request(DOMAIN).unwrap(), &SessionFields::new()).unwrap();
    assert!(next.valid);
    assert_eq!(next.fields, updated);
}

#[test]
fn set_session_data_refuses_stale_token() {
    let (server, client) = deployment(10);
    init(&server, &client);

    let stale = client.token(DOMAIN).unwrap();
    client.roll(DOMAIN, &mut direct(&server, SessionFields::new())).unwrap();

    assert_eq!(
        server.set_session_data(&stale, &SessionFields::new()).unwrap_err(),
        OatError::Auth(AuthError::FieldsTampered)
    );
}

#[test]
fn garbage_tokens_are_malformed() {
    let (server, _) = deployment(11);
    for token in ["", "no separator", "!!!|!!!", "AAAA|AAAA"] {
        assert!(matches!(server.roll(token, &SessionFields::new()), Err(OatError::MalformedToken(_))), "{token}");
    }
}

fn harness_env() -> oat_harness::SimEnv {
    oat_harness::SimEnv::with_seed(99)
}

fn vault_seal(token: &str) -> Vec<u8> {
    common::vault().seal(&[0x5a; 12], token.as_bytes())
}
