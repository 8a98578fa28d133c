//! Seeded simulation environment.
//!
//! All randomness the engines consume (ephemeral keys, vault nonces, ratchet
//! nonces) comes from one ChaCha20 stream, so a seed reproduces a run byte
//! for byte.

use std::sync::{Arc, Mutex};

use oat_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Deterministic [`Environment`] backed by a seeded ChaCha20 RNG.
///
/// Clones share the RNG stream, so a client and server built from clones of
/// one `SimEnv` interleave draws from a single sequence.
#[derive(Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha20Rng>>,
}

impl SimEnv {
    /// Environment seeded with 0.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Environment seeded with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))) }
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    /// # Panics
    ///
    /// Panics if the RNG mutex is poisoned. Acceptable for simulation code.
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().expect("RNG mutex poisoned").fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let a = SimEnv::with_seed(7);
        let b = SimEnv::with_seed(7);
        assert_eq!(a.random_array::<32>(), b.random_array::<32>());
    }

    #[test]
    fn clones_share_stream() {
        let a = SimEnv::with_seed(7);
        let b = a.clone();
        assert_ne!(a.random_array::<32>(), b.random_array::<32>());
    }
}
