//! Key-exchange request sent by a client that has no identity yet.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::errors::{ProtocolError, Result};

/// Client's public halves for a new key exchange.
///
/// Wire form: `base64(box_public[32] ++ sign_public[32])`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitRequest {
    /// Client's ephemeral X25519 public key
    pub box_public: [u8; 32],
    /// Client's Ed25519 verifying key
    pub sign_public: [u8; 32],
}

impl InitRequest {
    /// Decoded length
    pub const SIZE: usize = 64;

    /// Encode to the base64 wire string.
    pub fn encode(&self) -> String {
        let mut raw = [0u8; Self::SIZE];
        raw[..32].copy_from_slice(&self.box_public);
        raw[32..].copy_from_slice(&self.sign_public);
        STANDARD.encode(raw)
    }

    /// Decode the base64 wire string.
    pub fn decode(request: &str) -> Result<Self> {
        let raw = STANDARD
            .decode(request.trim())
            .map_err(|_| ProtocolError::InvalidBase64 { segment: "init request" })?;

        if raw.len() != Self::SIZE {
            return Err(ProtocolError::InvalidLength {
                segment: "init request",
                expected: Self::SIZE,
                actual: raw.len(),
            });
        }

        let mut box_public = [0u8; 32];
        let mut sign_public = [0u8; 32];
        box_public.copy_from_slice(&raw[..32]);
        sign_public.copy_from_slice(&raw[32..]);

        Ok(Self { box_public, sign_public })
    }
}
