//! Token footer: HMAC, client id, and session fields.

use crate::{
    ClientId, SessionFields,
    errors::{ProtocolError, Result},
};

/// Footer shared by every token shape.
///
/// Layout: `hmac[32] ++ client_id[20] ++ json(fields)`.
///
/// The JSON body is kept exactly as it was issued or received. The HMAC
/// covers those bytes, and [`Self::to_bytes`] writes them back unchanged, so
/// a footer never depends on `serde_json` printing a parsed value the same
/// way twice.
///
/// # Security
///
/// `hmac` authenticates `(client_id, fields_json, api_key)` for the api key
/// generation the footer was issued under. Decoding does not check it.
/// Fields read from an unchecked footer are untrusted.
#[derive(Debug, Clone, PartialEq)]
pub struct Footer {
    hmac: [u8; Footer::HMAC_SIZE],
    client_id: ClientId,
    fields: SessionFields,
    fields_json: Vec<u8>,
}

impl Footer {
    /// HMAC length
    pub const HMAC_SIZE: usize = 32;
    /// Fixed prefix length before the JSON body
    pub const PREFIX_SIZE: usize = Self::HMAC_SIZE + ClientId::SIZE;

    /// Footer with a precomputed HMAC over `fields.to_json_bytes()`.
    pub fn new(hmac: [u8; Self::HMAC_SIZE], client_id: ClientId, fields: SessionFields) -> Self {
        let fields_json = fields.to_json_bytes();
        Self { hmac, client_id, fields, fields_json }
    }

    /// Serialize `fields` once and MAC the exact bytes that go on the wire.
    pub fn sign(
        client_id: ClientId,
        fields: SessionFields,
        mac: impl FnOnce(&[u8]) -> [u8; Self::HMAC_SIZE],
    ) -> Self {
        let fields_json = fields.to_json_bytes();
        let hmac = mac(&fields_json);
        Self { hmac, client_id, fields, fields_json }
    }

    /// HMAC-SHA3-256 over client id, fields JSON, and api key.
    pub fn hmac(&self) -> &[u8; Self::HMAC_SIZE] {
        &self.hmac
    }

    /// Identity the token belongs to.
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Application session payload.
    pub fn fields(&self) -> &SessionFields {
        &self.fields
    }

    /// Fields JSON exactly as carried on the wire. This is the MAC input.
    pub fn fields_json(&self) -> &[u8] {
        &self.fields_json
    }

    /// Take the session payload.
    pub fn into_fields(self) -> SessionFields {
        self.fields
    }

    /// Serialize to raw footer bytes (before base64).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::PREFIX_SIZE + self.fields_json.len());
        out.extend_from_slice(&self.hmac);
        out.extend_from_slice(self.client_id.as_bytes());
        out.extend_from_slice(&self.fields_json);
        out
    }

    /// Parse raw footer bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::PREFIX_SIZE {
            return Err(ProtocolError::TooShort {
                segment: "footer",
                min: Self::PREFIX_SIZE,
                actual: bytes.len(),
            });
        }

        let (hmac_bytes, rest) = bytes.split_at(Self::HMAC_SIZE);
        let (id_bytes, json) = rest.split_at(ClientId::SIZE);

        let mut hmac = [0u8; Self::HMAC_SIZE];
        hmac.copy_from_slice(hmac_bytes);

        Ok(Self {
            hmac,
            client_id: ClientId::from_slice(id_bytes)?,
            fields: SessionFields::from_json_bytes(json)?,
            fields_json: json.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn layout_is_hmac_then_id_then_json() {
        let footer = Footer::new([1; 32], ClientId::from_bytes([2; 20]), SessionFields::new());
        let bytes = footer.to_bytes();

        assert_eq!(&bytes[..32], &[1; 32]);
        assert_eq!(&bytes[32..52], &[2; 20]);
        assert_eq!(&bytes[52..], b"{}");
    }

    #[test]
    fn decodes_what_it_encodes() {
        let footer = Footer::new(
            [0x5A; 32],
            ClientId::from_bytes([0xC3; 20]),
            SessionFields::try_from(json!({"cart": {"apple": 2}})).unwrap(),
        );
        assert_eq!(Footer::from_bytes(&footer.to_bytes()).unwrap(), footer);
    }

    #[test]
    fn rejects_short_footer() {
        assert!(matches!(
            Footer::from_bytes(&[0u8; 51]),
            Err(ProtocolError::TooShort { min: 52, actual: 51, .. })
        ));
    }

    #[test]
    fn rejects_missing_json_body() {
        // 52-byte prefix with no fields at all is not valid JSON
        assert!(matches!(Footer::from_bytes(&[0u8; 52]), Err(ProtocolError::InvalidFields(_))));
    }

    #[test]
    fn json_body_survives_byte_for_byte() {
        // Valid JSON that serde_json would print differently after a parse
        let body = br#"{ "price": 989.8597941207809, "qty": 1.50, "id": 18446744073709551615 }"#;
        let mut bytes = vec![7u8; Footer::PREFIX_SIZE];
        bytes.extend_from_slice(body);

        let footer = Footer::from_bytes(&bytes).unwrap();
        assert_eq!(footer.fields_json(), body);
        assert_eq!(footer.to_bytes(), bytes);
    }

    #[test]
    fn sign_macs_the_encoded_body() {
        let fields = SessionFields::try_from(json!({"price": 0.1})).unwrap();
        let footer = Footer::sign(ClientId::from_bytes([1; 20]), fields, |json| {
            let mut mac = [0u8; 32];
            mac[..json.len()].copy_from_slice(json);
            mac
        });
        assert_eq!(&footer.hmac()[..footer.fields_json().len()], br#"{"price":0.1}"#);
        assert!(footer.to_bytes().ends_with(footer.fields_json()));
    }
}
