//! Ed25519 signatures over roll requests
//!
//! A roll request header is the attached signature `sig(64) ‖ api_key(32) ‖
//! domain`. Binding the domain into the signed message stops a request
//! minted for one server from being replayed against another.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

use crate::{error::CryptoError, keys::ApiKey};

/// Signature length.
pub const SIGNATURE_SIZE: usize = 64;

/// Contents of a verified roll request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedApiKey {
    /// The api key the client presented
    pub api_key: ApiKey,
    /// Domain the client addressed, as raw bytes
    pub domain: Vec<u8>,
}

/// Sign `api_key ‖ domain` and return `sig ‖ api_key ‖ domain`.
pub fn sign_api_key(signing_key: &SigningKey, api_key: &ApiKey, domain: &str) -> Vec<u8> {
    let mut message = Vec::with_capacity(ApiKey::SIZE + domain.len());
    message.extend_from_slice(api_key.as_bytes());
    message.extend_from_slice(domain.as_bytes());

    let signature = signing_key.sign(&message);

    let mut signed = Vec::with_capacity(SIGNATURE_SIZE + message.len());
    signed.extend_from_slice(&signature.to_bytes());
    signed.extend_from_slice(&message);
    signed
}

/// Verify an attached signature and split out the api key and domain.
///
/// # Errors
///
/// - `BadSignature`: too short to hold a signature and key, or the signature
///   does not verify (strict verification, rejecting malleable encodings)
pub fn open_signed_api_key(verifying_key: &VerifyingKey, signed: &[u8]) -> Result<SignedApiKey, CryptoError> {
    if signed.len() < SIGNATURE_SIZE + ApiKey::SIZE {
        return Err(CryptoError::BadSignature);
    }

    let (signature, message) = signed.split_at(SIGNATURE_SIZE);
    let signature = Signature::from_slice(signature).map_err(|_| CryptoError::BadSignature)?;
    verifying_key.verify_strict(message, &signature).map_err(|_| CryptoError::BadSignature)?;

    let (key, domain) = message.split_at(ApiKey::SIZE);
    Ok(SignedApiKey { api_key: ApiKey::from_slice(key)?, domain: domain.to_vec() })
}

/// Parse a 32-byte Ed25519 public key.
///
/// # Errors
///
/// - `InvalidPublicKey`: bytes are not a valid curve point
pub fn verifying_key_from_bytes(bytes: &[u8; 32]) -> Result<VerifyingKey, CryptoError> {
    VerifyingKey::from_bytes(bytes).map_err(|_| CryptoError::InvalidPublicKey)
}
