//! X25519 key agreement and client identity
//!
//! Both sides generate a fresh box keypair per init. The client id is the
//! SHA-1 of the resulting shared secret, so client and server agree on it
//! without ever transmitting the secret.

use std::fmt;

use sha1::{Digest, Sha1};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::{error::CryptoError, keys::SharedKey};

/// An X25519 keypair built from caller-supplied random bytes.
pub struct BoxKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl BoxKeyPair {
    /// Public key length in bytes.
    pub const PUBLIC_SIZE: usize = 32;

    /// Build a keypair from 32 random bytes.
    ///
    /// The caller MUST provide cryptographically secure randomness in
    /// production. The seed is clamped by X25519.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let secret = StaticSecret::from(seed);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Public key bytes to send to the peer.
    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// Compute the shared secret with a peer's public key.
    ///
    /// # Errors
    ///
    /// - `NonContributory`: the peer key is a low-order point and the result
    ///   is all zeros
    pub fn diffie_hellman(&self, peer_public: &[u8; 32]) -> Result<SharedKey, CryptoError> {
        let shared = self.secret.diffie_hellman(&PublicKey::from(*peer_public));
        if !shared.was_contributory() {
            return Err(CryptoError::NonContributory);
        }
        Ok(SharedKey::from_bytes(shared.to_bytes()))
    }
}

impl fmt::Debug for BoxKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxKeyPair").field("public", &self.public).finish_non_exhaustive()
    }
}

/// SHA-1 of the shared secret: the 20-byte client id.
pub fn derive_client_id(shared: &SharedKey) -> [u8; 20] {
    let digest = Sha1::digest(shared.as_bytes());
    let mut id = [0u8; 20];
    id.copy_from_slice(&digest);
    id
}
