//! Token header variants.
//!
//! Three shapes exist, one per protocol phase and direction. They are modelled
//! as a tagged union; the on-wire length is only a discriminant and is
//! consulted once, during decoding.

use crate::errors::{ProtocolError, Result};

/// An api key encrypted under the client's shared key.
///
/// Layout: `nonce[12] ++ ciphertext[32]` (44 bytes). The ciphertext is the
/// AES-256-GCM keystream applied to the key without the 16-byte tag; its
/// integrity is provided by the footer HMAC, which binds the plaintext key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptedApiKey {
    /// Random 96-bit AES-GCM nonce
    pub nonce: [u8; EncryptedApiKey::NONCE_SIZE],
    /// Encrypted 32-byte api key
    pub ciphertext: [u8; EncryptedApiKey::CIPHERTEXT_SIZE],
}

impl EncryptedApiKey {
    /// Nonce length
    pub const NONCE_SIZE: usize = 12;
    /// Ciphertext length (equal to the api key length)
    pub const CIPHERTEXT_SIZE: usize = 32;
    /// Serialized length
    pub const SIZE: usize = Self::NONCE_SIZE + Self::CIPHERTEXT_SIZE;

    /// Serialize as `nonce ++ ciphertext`.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..Self::NONCE_SIZE].copy_from_slice(&self.nonce);
        out[Self::NONCE_SIZE..].copy_from_slice(&self.ciphertext);
        out
    }

    /// Parse from exactly [`Self::SIZE`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(ProtocolError::InvalidLength {
                segment: "encrypted api key",
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }

        let mut nonce = [0u8; Self::NONCE_SIZE];
        let mut ciphertext = [0u8; Self::CIPHERTEXT_SIZE];
        nonce.copy_from_slice(&bytes[..Self::NONCE_SIZE]);
        ciphertext.copy_from_slice(&bytes[Self::NONCE_SIZE..]);

        Ok(Self { nonce, ciphertext })
    }
}

/// Header of the server's reply to a key exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitResponseHeader {
    /// Server's ephemeral X25519 public key
    pub server_box_public: [u8; InitResponseHeader::BOX_PUBLIC_SIZE],
    /// First api key, encrypted under the new shared key
    pub api_key: EncryptedApiKey,
}

impl InitResponseHeader {
    /// X25519 public key length
    pub const BOX_PUBLIC_SIZE: usize = 32;
    /// Serialized length (76 bytes)
    pub const SIZE: usize = Self::BOX_PUBLIC_SIZE + EncryptedApiKey::SIZE;
}

/// Header of the server's reply to a roll request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollResponseHeader {
    /// Next api key, encrypted under the shared key
    pub api_key: EncryptedApiKey,
}

impl RollResponseHeader {
    /// Serialized length (44 bytes)
    pub const SIZE: usize = EncryptedApiKey::SIZE;
}

/// Header of a client roll request: an Ed25519 signed message.
///
/// Layout: `signature[64] ++ api_key[32] ++ domain` (signature prefixed to
/// the signed message). The message is NOT trustworthy until the signature
/// has been verified against the client's registered key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollRequestHeader {
    signed: Vec<u8>,
}

impl RollRequestHeader {
    /// Ed25519 signature length
    pub const SIGNATURE_SIZE: usize = 64;
    /// Api key length inside the signed message
    pub const API_KEY_SIZE: usize = 32;
    /// Smallest valid header (empty domain)
    pub const MIN_SIZE: usize = Self::SIGNATURE_SIZE + Self::API_KEY_SIZE;

    /// Wrap a signed message, checking only its minimum length.
    pub fn new(signed: Vec<u8>) -> Result<Self> {
        if signed.len() < Self::MIN_SIZE {
            return Err(ProtocolError::TooShort {
                segment: "roll request header",
                min: Self::MIN_SIZE,
                actual: signed.len(),
            });
        }
        Ok(Self { signed })
    }

    /// Full `signature ++ message` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.signed
    }

    /// Signature prefix.
    pub fn signature(&self) -> &[u8] {
        &self.signed[..Self::SIGNATURE_SIZE]
    }

    /// Signed message (`api_key ++ domain`), unverified.
    pub fn message(&self) -> &[u8] {
        &self.signed[Self::SIGNATURE_SIZE..]
    }
}

/// Tagged union of all header shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    /// Server -> client, key exchange reply (76 bytes on the wire)
    InitResponse(InitResponseHeader),
    /// Client -> server, signed api key and domain
    RollRequest(RollRequestHeader),
    /// Server -> client, roll reply (44 bytes on the wire)
    RollResponse(RollResponseHeader),
}

impl Header {
    /// Encrypted api key carried by server-issued headers.
    pub fn encrypted_api_key(&self) -> Option<&EncryptedApiKey> {
        match self {
            Self::InitResponse(h) => Some(&h.api_key),
            Self::RollResponse(h) => Some(&h.api_key),
            Self::RollRequest(_) => None,
        }
    }

    /// Serialize to raw header bytes (before base64).
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::InitResponse(h) => {
                let mut out = Vec::with_capacity(InitResponseHeader::SIZE);
                out.extend_from_slice(&h.server_box_public);
                out.extend_from_slice(&h.api_key.to_bytes());
                out
            },
            Self::RollRequest(h) => h.signed.clone(),
            Self::RollResponse(h) => h.api_key.to_bytes().to_vec(),
        }
    }

    /// Decode a server-issued header.
    ///
    /// 76 bytes is an init response; anything else must be a 44-byte roll
    /// response.
    pub fn decode_response(bytes: &[u8]) -> Result<Self> {
        if bytes.len() == InitResponseHeader::SIZE {
            let (box_public, api_key) = bytes.split_at(InitResponseHeader::BOX_PUBLIC_SIZE);
            let mut server_box_public = [0u8; InitResponseHeader::BOX_PUBLIC_SIZE];
            server_box_public.copy_from_slice(box_public);

            return Ok(Self::InitResponse(InitResponseHeader {
                server_box_public,
                api_key: EncryptedApiKey::from_bytes(api_key)?,
            }));
        }

        if bytes.len() != RollResponseHeader::SIZE {
            return Err(ProtocolError::InvalidLength {
                segment: "response header",
                expected: RollResponseHeader::SIZE,
                actual: bytes.len(),
            });
        }

        Ok(Self::RollResponse(RollResponseHeader { api_key: EncryptedApiKey::from_bytes(bytes)? }))
    }

    /// Decode a client-issued header.
    pub fn decode_request(bytes: &[u8]) -> Result<Self> {
        RollRequestHeader::new(bytes.to_vec()).map(Self::RollRequest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encrypted(fill: u8) -> EncryptedApiKey {
        EncryptedApiKey { nonce: [fill; 12], ciphertext: [fill.wrapping_add(1); 32] }
    }

    #[test]
    fn init_response_is_76_bytes() {
        let header = Header::InitResponse(InitResponseHeader {
            server_box_public: [7; 32],
            api_key: encrypted(1),
        });
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), 76);
        assert_eq!(Header::decode_response(&bytes).unwrap(), header);
    }

    #[test]
    fn roll_response_is_44_bytes() {
        let header = Header::RollResponse(RollResponseHeader { api_key: encrypted(9) });
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), 44);
        assert_eq!(Header::decode_response(&bytes).unwrap(), header);
    }

    #[test]
    fn response_length_selects_variant() {
        assert!(matches!(Header::decode_response(&[0u8; 76]), Ok(Header::InitResponse(_))));
        assert!(matches!(Header::decode_response(&[0u8; 44]), Ok(Header::RollResponse(_))));
    }

    #[test]
    fn response_rejects_other_lengths() {
        for len in [0, 43, 45, 60, 75, 77, 160] {
            assert!(
                matches!(
                    Header::decode_response(&vec![0u8; len]),
                    Err(ProtocolError::InvalidLength { expected: 44, .. })
                ),
                "length {len} must be rejected"
            );
        }
    }

    #[test]
    fn request_splits_signature_and_message() {
        let mut signed = vec![0xAA; 64];
        signed.extend_from_slice(&[0xBB; 32]);
        signed.extend_from_slice(b"shop.example");

        let Header::RollRequest(header) = Header::decode_request(&signed).unwrap() else {
            unreachable!("request bytes decode as a roll request");
        };
        assert_eq!(header.signature(), &[0xAA; 64]);
        assert_eq!(&header.message()[..32], &[0xBB; 32]);
        assert_eq!(&header.message()[32..], b"shop.example");
    }

    #[test]
    fn request_rejects_short_headers() {
        assert!(matches!(
            Header::decode_request(&[0u8; 95]),
            Err(ProtocolError::TooShort { min: 96, actual: 95, .. })
        ));
    }

    #[test]
    fn only_responses_carry_an_api_key() {
        let request = Header::decode_request(&[0u8; 96]).unwrap();
        assert!(request.encrypted_api_key().is_none());

        let response = Header::RollResponse(RollResponseHeader { api_key: encrypted(3) });
        assert_eq!(response.encrypted_api_key(), Some(&encrypted(3)));
    }
}
