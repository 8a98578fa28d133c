//! AES-256-GCM sealing and api key wrapping
//!
//! All functions are pure. Nonces must be provided by the caller.
//!
//! Two framings are used:
//!
//! - [`seal`] / [`open`]: `nonce(12) ‖ ciphertext ‖ tag(16)`, the at-rest
//!   and challenge format
//! - [`wrap_api_key`] / [`unwrap_api_key`]: the 32-byte GCM ciphertext of an
//!   api key with the tag dropped, as carried in 44-byte token headers

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadInPlace, KeyInit},
};
use zeroize::Zeroizing;

use crate::{
    error::CryptoError,
    keys::{ApiKey, SharedKey},
};

/// GCM nonce size (96 bits).
pub const NONCE_SIZE: usize = 12;

/// GCM authentication tag size.
pub const TAG_SIZE: usize = 16;

/// Encrypt `plaintext` under `key`.
///
/// Returns `nonce ‖ ciphertext ‖ tag`. The caller MUST NOT reuse a nonce
/// under the same key.
pub fn seal(key: &[u8; 32], nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> Vec<u8> {
    let cipher = Aes256Gcm::new(key.into());

    let Ok(ciphertext) = cipher.encrypt(Nonce::from_slice(nonce), plaintext) else {
        unreachable!("AES-256-GCM encryption cannot fail for in-memory buffers");
    };

    let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(nonce);
    blob.extend_from_slice(&ciphertext);
    blob
}

/// Decrypt a blob produced by [`seal`].
///
/// # Errors
///
/// - `DecryptionFailed`: blob shorter than nonce plus tag, wrong key, or any
///   tampering. No further detail is given.
pub fn open(key: &[u8; 32], blob: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if blob.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::DecryptionFailed);
    }

    let (nonce, ciphertext) = blob.split_at(NONCE_SIZE);
    let cipher = Aes256Gcm::new(key.into());

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Encrypt an api key for transport, discarding the GCM tag.
///
/// The output equals the first 32 bytes of a full GCM encryption with the
/// same key and nonce. Integrity of the key is established later by the
/// signature over it and the server's ratchet comparison.
pub fn wrap_api_key(shared: &SharedKey, nonce: &[u8; NONCE_SIZE], api_key: &ApiKey) -> [u8; 32] {
    apply_keystream(shared, nonce, *api_key.as_bytes())
}

/// Recover an api key wrapped by [`wrap_api_key`].
///
/// Without a tag nothing can be authenticated here: a wrong key or nonce
/// yields a wrong api key, which the server then rejects.
pub fn unwrap_api_key(shared: &SharedKey, nonce: &[u8; NONCE_SIZE], ciphertext: &[u8; 32]) -> ApiKey {
    ApiKey::from_bytes(apply_keystream(shared, nonce, *ciphertext))
}

// GCM's payload encryption is CTR mode, so applying it twice is the identity.
fn apply_keystream(shared: &SharedKey, nonce: &[u8; NONCE_SIZE], mut buf: [u8; 32]) -> [u8; 32] {
    let cipher = Aes256Gcm::new(shared.as_bytes().into());

    let Ok(_tag) = cipher.encrypt_in_place_detached(Nonce::from_slice(nonce), &[], &mut buf) else {
        unreachable!("AES-256-GCM encryption cannot fail for a 32-byte buffer");
    };

    buf
}
