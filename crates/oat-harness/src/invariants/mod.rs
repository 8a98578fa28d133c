//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold during system execution.
//! Unlike example-based tests that check specific scenarios, invariants
//! verify behavioral properties across all fault schedules.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! registry.assert_all(&world.snapshot()?, "after roll");
//! ```

mod checks;
mod snapshot;

pub use checks::{IdentityAgreement, KeyWithinWindow, SingleCommit};
pub use snapshot::{ClientSnapshot, OperationRecord, ServerSnapshot, SystemSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against system state.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against a snapshot.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard protocol invariants.
    ///
    /// Includes:
    /// - [`KeyWithinWindow`]: client key is current or previous
    /// - [`IdentityAgreement`]: client id known to the server
    /// - [`SingleCommit`]: one `valid = true` roll per logical operation
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(KeyWithinWindow);
        registry.add(IdentityAgreement);
        registry.add(SingleCommit);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants, collecting every violation.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with every violation.
    ///
    /// Use this in tests where you want immediate failure with context.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use oat_crypto::ApiKey;
    use oat_proto::ClientId;

    use super::*;

    fn snapshot(client_key: u8, current: u8, previous: u8) -> SystemSnapshot {
        let id = ClientId::from_bytes([1; 20]);
        SystemSnapshot {
            client: Some(ClientSnapshot { client_id: id, api_key: ApiKey::from_bytes([client_key; 32]) }),
            servers: vec![ServerSnapshot {
                client_id: id,
                current: ApiKey::from_bytes([current; 32]),
                previous: ApiKey::from_bytes([previous; 32]),
            }],
            operations: Vec::new(),
        }
    }

    #[test]
    fn standard_registry_has_invariants() {
        assert_eq!(InvariantRegistry::standard().len(), 3);
    }

    #[test]
    fn empty_snapshot_passes() {
        assert!(InvariantRegistry::standard().check_all(&SystemSnapshot::empty()).is_ok());
    }

    #[test]
    fn key_in_window_passes() {
        let registry = InvariantRegistry::standard();
        assert!(registry.check_all(&snapshot(2, 2, 1)).is_ok());
        assert!(registry.check_all(&snapshot(1, 2, 1)).is_ok());
    }

    #[test]
    fn stale_key_violates() {
        let violations = InvariantRegistry::standard().check_all(&snapshot(0, 2, 1)).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].invariant, "KeyWithinWindow");
    }

    #[test]
    fn double_commit_violates() {
        let mut state = snapshot(2, 2, 1);
        state.operations.push(OperationRecord { commits: 2, resyncs: 0, completed: true });
        let violations = InvariantRegistry::standard().check_all(&state).unwrap_err();
        assert_eq!(violations[0].invariant, "SingleCommit");
    }

    #[test]
    fn unknown_client_violates_identity_agreement() {
        let mut state = snapshot(2, 2, 1);
        state.servers.clear();
        let violations = InvariantRegistry::standard().check_all(&state).unwrap_err();
        assert_eq!(violations[0].invariant, "IdentityAgreement");
    }
}
