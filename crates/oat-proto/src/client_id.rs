//! Client identifier derived from the key-exchange shared secret.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// 20-byte identifier of one client/server pairing.
///
/// Both parties compute it as SHA-1 of the X25519 shared secret, so it is
/// structurally identical on each side of a handshake. On the wire it is 20
/// raw bytes; as a storage key it renders as 40 uppercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId([u8; ClientId::SIZE]);

impl ClientId {
    /// Size of the raw identifier
    pub const SIZE: usize = 20;

    /// Wrap raw identifier bytes.
    pub const fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse from a byte slice of exactly [`Self::SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; Self::SIZE] = bytes.try_into().map_err(|_| ProtocolError::InvalidLength {
            segment: "client id",
            expected: Self::SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(raw))
    }

    /// Raw identifier bytes.
    pub const fn as_bytes(&self) -> &[u8; Self::SIZE] {
        &self.0
    }

    /// Uppercase hex rendering used as a storage key.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// Parse a 40-character hex string (either case).
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| ProtocolError::InvalidClientId(e.to_string()))?;
        Self::from_slice(&bytes).map_err(|_| {
            ProtocolError::InvalidClientId(format!("expected 40 hex characters, got {}", s.len()))
        })
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientId({})", self.to_hex())
    }
}

impl FromStr for ClientId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_uppercase_hex() {
        let id = ClientId::from_bytes([0xab; 20]);
        assert_eq!(id.to_string(), "AB".repeat(20));
        assert_eq!(id.to_hex().len(), 40);
    }

    #[test]
    fn hex_parse_accepts_either_case() {
        let id = ClientId::from_bytes([0x0f; 20]);
        assert_eq!(ClientId::from_hex(&"0f".repeat(20)).unwrap(), id);
        assert_eq!("0F".repeat(20).parse::<ClientId>().unwrap(), id);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(ClientId::from_hex("ABCD"), Err(ProtocolError::InvalidClientId(_))));
        assert!(matches!(
            ClientId::from_slice(&[0u8; 32]),
            Err(ProtocolError::InvalidLength { expected: 20, actual: 32, .. })
        ));
    }

    #[test]
    fn rejects_non_hex() {
        assert!(ClientId::from_hex(&"ZZ".repeat(20)).is_err());
    }
}
