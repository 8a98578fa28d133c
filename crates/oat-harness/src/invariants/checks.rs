//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// The client's api key is one the server would accept.
///
/// Lost responses may leave the client one generation behind, never more:
/// the client's key equals the server's current or previous generation.
pub struct KeyWithinWindow;

impl Invariant for KeyWithinWindow {
    fn name(&self) -> &'static str {
        "KeyWithinWindow"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(client) = &state.client else { return Ok(()) };
        let Some(server) = state.server_for(&client.client_id) else { return Ok(()) };

        if client.api_key.ct_eq(&server.current) || client.api_key.ct_eq(&server.previous) {
            Ok(())
        } else {
            Err(Violation {
                invariant: self.name(),
                message: format!("client {} holds a key outside the window", client.client_id),
            })
        }
    }
}

/// Client and server agree on the client id.
///
/// A client with an identity must be known to the server under the same
/// id it computed.
pub struct IdentityAgreement;

impl Invariant for IdentityAgreement {
    fn name(&self) -> &'static str {
        "IdentityAgreement"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(client) = &state.client else { return Ok(()) };
        if state.server_for(&client.client_id).is_some() {
            Ok(())
        } else {
            Err(Violation {
                invariant: self.name(),
                message: format!("server has no record for client {}", client.client_id),
            })
        }
    }
}

/// Each logical roll commits side effects at most once.
///
/// Retries after a lost response resync with `valid = false`, so a
/// completed operation shows exactly one `valid = true` roll and an
/// abandoned one at most one.
pub struct SingleCommit;

impl Invariant for SingleCommit {
    fn name(&self) -> &'static str {
        "SingleCommit"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for (i, op) in state.operations.iter().enumerate() {
            let ok = if op.completed { op.commits == 1 } else { op.commits <= 1 };
            if !ok {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "operation {i}: {} commits, {} resyncs, completed={}",
                        op.commits, op.resyncs, op.completed
                    ),
                });
            }
        }
        Ok(())
    }
}
