//! Api key ratchet
//!
//! # Security Properties
//!
//! - Possession: the next key is a keyed hash of the current key, so only a
//!   holder of the current key can derive it
//! - Unpredictability: a fresh 32-byte nonce enters every step
//! - Determinism: the same `(key, nonce)` always yields the same successor

use crate::keys::{ApiKey, hmac_sha3};

/// Label for the master-key subkey that mints first-generation api keys.
pub const ISSUANCE_LABEL: &[u8] = b"oatApiKeyIssuanceV1";

/// Derive the successor of `current`: `HMAC-SHA3-256(current, nonce)`.
pub fn next_api_key(current: &ApiKey, nonce: &[u8; 32]) -> ApiKey {
    ApiKey::from_bytes(hmac_sha3(current.as_bytes(), &[nonce]))
}

/// Mint a first-generation api key: `HMAC-SHA3-256(issuance_key, seed)`.
pub fn issue_api_key(issuance_key: &[u8; 32], seed: &[u8; 32]) -> ApiKey {
    ApiKey::from_bytes(hmac_sha3(issuance_key, &[seed]))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    fn nonce(i: u32) -> [u8; 32] {
        let mut n = [0u8; 32];
        n[..4].copy_from_slice(&i.to_le_bytes());
        n
    }

    #[test]
    fn deterministic() {
        let key = ApiKey::from_bytes([3; 32]);
        assert_eq!(next_api_key(&key, &nonce(1)), next_api_key(&key, &nonce(1)));
    }

    #[test]
    fn nonce_changes_successor() {
        let key = ApiKey::from_bytes([3; 32]);
        assert_ne!(next_api_key(&key, &nonce(1)), next_api_key(&key, &nonce(2)));
    }

    #[test]
    fn successor_differs_from_current() {
        let key = ApiKey::from_bytes([3; 32]);
        assert_ne!(next_api_key(&key, &nonce(1)), key);
    }

    #[test]
    fn ten_thousand_generations_distinct() {
        let mut key = ApiKey::from_bytes([0; 32]);
        let mut seen = HashSet::new();
        seen.insert(*key.as_bytes());

        for i in 0..10_000 {
            key = next_api_key(&key, &nonce(i));
            assert!(seen.insert(*key.as_bytes()), "repeated key at generation {i}");
        }
    }

    #[test]
    fn issuance_depends_on_key_and_seed() {
        let a = issue_api_key(&[1; 32], &[9; 32]);
        assert_ne!(a, issue_api_key(&[2; 32], &[9; 32]));
        assert_ne!(a, issue_api_key(&[1; 32], &[8; 32]));
        assert_eq!(a, issue_api_key(&[1; 32], &[9; 32]));
    }

    proptest! {
        #[test]
        fn chains_with_same_nonces_agree(
            seed in any::<[u8; 32]>(),
            nonces in prop::collection::vec(any::<[u8; 32]>(), 1..20),
        ) {
            let mut client = ApiKey::from_bytes(seed);
            let mut server = ApiKey::from_bytes(seed);
            for n in &nonces {
                client = next_api_key(&client, n);
                server = next_api_key(&server, n);
            }
            prop_assert_eq!(client, server);
        }
    }
}
