//! Roll request authentication
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. Ed25519 signature over `api_key ‖ domain` against the registered key
//! 2. Signed domain equals the server's domain
//! 3. Footer HMAC over `client_id ‖ fields ‖ api_key`
//! 4. Presented api key equals the generation under test
//!
//! Steps 1-3 do not depend on which generation is tested, so
//! [`verify_request`] runs them once and [`VerifiedRequest::matches`] is
//! applied per generation. Only a step 4 failure lets the ratchet fall
//! through to the previous generation.

use oat_crypto::{ApiKey, VerifyingKey, open_signed_api_key, verify_session_mac};
use oat_proto::{ClientId, Footer, RollRequestHeader, SessionFields};

use crate::error::AuthError;

/// Which retained generation a request matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    /// The most recently issued api key
    Current,
    /// The generation before it (client missed one response)
    Previous,
}

/// A request whose signature, domain, and fields have been verified.
#[derive(Debug, Clone)]
pub struct VerifiedRequest {
    /// Client the footer names
    pub client_id: ClientId,
    /// Api key the client signed
    pub api_key: ApiKey,
    /// Session fields, now trusted
    pub fields: SessionFields,
}

impl VerifiedRequest {
    /// Constant-time comparison against one retained generation.
    pub fn matches(&self, generation: &ApiKey) -> Result<(), AuthError> {
        if self.api_key.ct_eq(generation) { Ok(()) } else { Err(AuthError::KeyMismatch) }
    }
}

/// Outcome of a successful authentication.
#[derive(Debug, Clone)]
pub struct ClientAuthResult {
    /// Authenticated client
    pub client_id: ClientId,
    /// Generation the presented key matched
    pub generation: Generation,
    /// Verified session fields
    pub fields: SessionFields,
}

/// Run checks 1-3 on a decoded roll request.
pub fn verify_request(
    expected_domain: &str,
    header: &RollRequestHeader,
    footer: &Footer,
    verifying_key: &VerifyingKey,
    mac_key: &[u8; 32],
) -> Result<VerifiedRequest, AuthError> {
    let signed =
        open_signed_api_key(verifying_key, header.as_bytes()).map_err(|_| AuthError::BadSignature)?;

    if signed.domain != expected_domain.as_bytes() {
        return Err(AuthError::DomainMismatch);
    }

    let client_id = footer.client_id();
    if !verify_session_mac(mac_key, client_id.as_bytes(), footer.fields_json(), &signed.api_key, footer.hmac()) {
        return Err(AuthError::FieldsTampered);
    }

    Ok(VerifiedRequest { client_id, api_key: signed.api_key, fields: footer.fields().clone() })
}

/// Run all four checks against a single generation.
pub fn authenticate(
    expected_domain: &str,
    header: &RollRequestHeader,
    footer: &Footer,
    verifying_key: &VerifyingKey,
    mac_key: &[u8; 32],
    generation: &ApiKey,
) -> Result<VerifiedRequest, AuthError> {
    let verified = verify_request(expected_domain, header, footer, verifying_key, mac_key)?;
    verified.matches(generation)?;
    Ok(verified)
}
