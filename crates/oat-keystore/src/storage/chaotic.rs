//! Chaotic storage wrapper for fault injection testing
//!
//! Store wrapper that randomly fails operations to test error handling and
//! recovery. Used for chaos testing to ensure a failed write never leaves a
//! client outside the server's two-generation window.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::sync::{Arc, Mutex};

use oat_core::{ClientRecord, ClientStore, KeyRecord, KeyStore, SealedRatchet, StorageError};
use oat_proto::ClientId;

/// When an injected write failure happens relative to the real write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    /// The write is skipped and the caller sees an error
    BeforeWrite,
    /// The write commits but the caller still sees an error, as if the
    /// acknowledgement was lost
    AfterWrite,
}

/// Chaotic store wrapper that randomly injects failures
///
/// Delegates to an underlying store but randomly fails operations based on a
/// configured failure rate. Wraps either store role: it implements
/// [`KeyStore`] when `S` does and [`ClientStore`] when `S` does. Uses
/// Arc<Mutex<>> for the RNG state, making it Clone and thread-safe.
#[derive(Clone)]
pub struct ChaoticStore<S> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    failure_point: FailurePoint,
    /// RNG state for deterministic chaos
    rng: Arc<Mutex<ChaoticRng>>,
    operation_count: Arc<Mutex<usize>>,
}

/// Simple deterministic RNG for chaos injection
///
/// Uses linear congruential generator (LCG) for fast, deterministic randomness.
/// This ensures chaos tests are reproducible with the same seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate next random value [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // LCG constants from Numerical Recipes
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }

    fn should_fail(&mut self, failure_rate: f64) -> bool {
        self.next() < failure_rate
    }
}

impl<S> ChaoticStore<S> {
    /// Create a new chaotic wrapper that fails writes before they happen
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Create with explicit seed for reproducible chaos
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            failure_point: FailurePoint::BeforeWrite,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Choose where injected write failures land. Reads always fail before
    /// touching the inner store.
    #[must_use]
    pub fn with_failure_point(mut self, point: FailurePoint) -> Self {
        self.failure_point = point;
        self
    }

    /// Underlying store (for checking invariants after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of store operations attempted.
    pub fn operation_count(&self) -> usize {
        #[allow(clippy::expect_used)]
        *self.operation_count.lock().expect("operation_count mutex poisoned")
    }

    fn increment_operation_count(&self) {
        #[allow(clippy::expect_used)]
        let mut count = self.operation_count.lock().expect("operation_count mutex poisoned");
        *count += 1;
    }

    fn should_fail(&self) -> bool {
        #[allow(clippy::expect_used)]
        self.rng.lock().expect("ChaoticRng mutex poisoned").should_fail(self.failure_rate)
    }

    fn read<T>(&self, op: impl FnOnce(&S) -> Result<T, StorageError>) -> Result<T, StorageError> {
        self.increment_operation_count();
        if self.should_fail() {
            return Err(injected());
        }
        op(&self.inner)
    }

    fn write(&self, op: impl FnOnce(&S) -> Result<(), StorageError>) -> Result<(), StorageError> {
        self.increment_operation_count();
        if !self.should_fail() {
            return op(&self.inner);
        }
        if self.failure_point == FailurePoint::AfterWrite {
            op(&self.inner)?;
        }
        Err(injected())
    }
}

fn injected() -> StorageError {
    StorageError::Io("chaotic failure injection".to_string())
}

impl<S: KeyStore> KeyStore for ChaoticStore<S> {
    fn insert_client(&self, client_id: &ClientId, record: &KeyRecord) -> Result<(), StorageError> {
        self.write(|inner| inner.insert_client(client_id, record))
    }

    fn load_client(&self, client_id: &ClientId) -> Result<Option<KeyRecord>, StorageError> {
        self.read(|inner| inner.load_client(client_id))
    }

    fn swap_ratchet(
        &self,
        client_id: &ClientId,
        expected: &SealedRatchet,
        next: &SealedRatchet,
    ) -> Result<(), StorageError> {
        self.write(|inner| inner.swap_ratchet(client_id, expected, next))
    }

    fn remove_client(&self, client_id: &ClientId) -> Result<(), StorageError> {
        self.write(|inner| inner.remove_client(client_id))
    }

    fn list_clients(&self) -> Result<Vec<ClientId>, StorageError> {
        self.read(KeyStore::list_clients)
    }
}

impl<S: ClientStore> ClientStore for ChaoticStore<S> {
    fn store_identity(&self, domain: &str, record: &ClientRecord) -> Result<(), StorageError> {
        self.write(|inner| inner.store_identity(domain, record))
    }

    fn load_identity(&self, domain: &str) -> Result<Option<ClientRecord>, StorageError> {
        self.read(|inner| inner.load_identity(domain))
    }

    fn replace_token(&self, domain: &str, sealed_token: &[u8]) -> Result<(), StorageError> {
        self.write(|inner| inner.replace_token(domain, sealed_token))
    }

    fn remove_identity(&self, domain: &str) -> Result<(), StorageError> {
        self.write(|inner| inner.remove_identity(domain))
    }

    fn list_domains(&self) -> Result<Vec<String>, StorageError> {
        self.read(ClientStore::list_domains)
    }
}
