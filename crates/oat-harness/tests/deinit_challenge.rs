//! Challenge-based teardown over the simulated link.

use oat_core::{OatError, TransportError};
use oat_harness::SimWorld;

#[test]
fn challenge_answer_erases_both_sides() {
    let mut world = SimWorld::new(9).unwrap();
    let client_id = world.init().unwrap();

    let request = world.client().roll_request(SimWorld::DOMAIN).unwrap();
    let challenge = world.server().issue_challenge(&request, "deinit/5f2c9a").unwrap();
    assert_eq!(challenge.client_id, client_id);

    let server = world.server().clone();
    let mut answered = None;
    let mut transport = |answer: &str| -> Result<String, TransportError> {
        answered = Some(answer.to_owned());
        server.deinit(&client_id).map_err(|e| TransportError(e.to_string()))?;
        Ok(String::new())
    };
    world
        .client()
        .deinit_with_challenge(SimWorld::DOMAIN, &challenge.encrypted, &mut transport)
        .unwrap();

    assert_eq!(answered.as_deref(), Some("deinit/5f2c9a"));
    assert!(world.client().list_domains().unwrap().is_empty());
    assert!(world.server().list_clients().unwrap().is_empty());
}

#[test]
fn failed_answer_keeps_identity() {
    let mut world = SimWorld::new(10).unwrap();
    world.init().unwrap();

    let request = world.client().roll_request(SimWorld::DOMAIN).unwrap();
    let challenge = world.server().issue_challenge(&request, "deinit/abc").unwrap();

    let mut transport = |_: &str| -> Result<String, TransportError> { Err(TransportError("refused".into())) };
    let err = world
        .client()
        .deinit_with_challenge(SimWorld::DOMAIN, &challenge.encrypted, &mut transport)
        .unwrap_err();

    assert!(matches!(err, OatError::Transport(_)));
    assert_eq!(world.client().list_domains().unwrap(), vec![SimWorld::DOMAIN.to_owned()]);
}

#[test]
fn forged_challenge_rejected() {
    let mut world = SimWorld::new(11).unwrap();
    world.init().unwrap();

    let mut transport = |_: &str| -> Result<String, TransportError> { Ok(String::new()) };
    let err = world
        .client()
        .deinit_with_challenge(SimWorld::DOMAIN, "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", &mut transport)
        .unwrap_err();

    assert!(matches!(err, OatError::Crypto(_)));
    assert_eq!(world.client().list_domains().unwrap().len(), 1);
}
