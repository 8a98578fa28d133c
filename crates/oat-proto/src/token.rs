//! Complete token: header and footer joined by `|`.
//!
//! Decoding is pure. It validates structure only and never touches key
//! material or storage.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{
    ClientId, Footer, Header, SessionFields,
    errors::{ProtocolError, Result},
};

/// Separator between the header and footer segments.
pub const SEPARATOR: char = '|';

/// A decoded token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Phase-specific header
    pub header: Header,
    /// HMAC-protected footer
    pub footer: Footer,
}

impl Token {
    /// Encode to the `base64(header)|base64(footer)` wire string.
    pub fn encode(&self) -> String {
        format!(
            "{}{SEPARATOR}{}",
            STANDARD.encode(self.header.to_bytes()),
            STANDARD.encode(self.footer.to_bytes())
        )
    }

    /// Decode a client-issued roll request.
    pub fn decode_request(token: &str) -> Result<Self> {
        let (header, footer) = split(token)?;
        Ok(Self {
            header: Header::decode_request(&decode_segment(header, "header")?)?,
            footer: Footer::from_bytes(&decode_segment(footer, "footer")?)?,
        })
    }

    /// Decode a server-issued init or roll response.
    pub fn decode_response(token: &str) -> Result<Self> {
        let (header, footer) = split(token)?;
        Ok(Self {
            header: Header::decode_response(&decode_segment(header, "header")?)?,
            footer: Footer::from_bytes(&decode_segment(footer, "footer")?)?,
        })
    }
}

/// Join a header with an already-encoded footer segment.
///
/// Used by clients to build a roll request around the footer the server
/// issued, byte for byte.
pub fn encode_with_footer(header: &Header, footer_segment: &str) -> String {
    format!("{}{SEPARATOR}{footer_segment}", STANDARD.encode(header.to_bytes()))
}

/// Raw base64 footer segment of a token.
///
/// Clients forward this verbatim when building a roll request.
pub fn footer_segment(token: &str) -> Result<&str> {
    split(token).map(|(_, footer)| footer)
}

/// Read session fields WITHOUT verifying the footer HMAC.
///
/// The result is untrusted. Do not act on it without a subsequent
/// authenticated roll or authentication call.
pub fn session_data(token: &str) -> Result<SessionFields> {
    let footer = Footer::from_bytes(&decode_segment(footer_segment(token)?, "footer")?)?;
    Ok(footer.into_fields())
}

/// Read the client id from a footer WITHOUT verifying the HMAC.
pub fn peek_client_id(token: &str) -> Result<ClientId> {
    let footer = decode_segment(footer_segment(token)?, "footer")?;
    if footer.len() < Footer::PREFIX_SIZE {
        return Err(ProtocolError::TooShort {
            segment: "footer",
            min: Footer::PREFIX_SIZE,
            actual: footer.len(),
        });
    }
    ClientId::from_slice(&footer[Footer::HMAC_SIZE..Footer::PREFIX_SIZE])
}

/// Split on the first separator only.
fn split(token: &str) -> Result<(&str, &str)> {
    token.trim().split_once(SEPARATOR).ok_or(ProtocolError::MissingSeparator)
}

fn decode_segment(segment: &str, name: &'static str) -> Result<Vec<u8>> {
    STANDARD.decode(segment).map_err(|_| ProtocolError::InvalidBase64 { segment: name })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{EncryptedApiKey, RollResponseHeader};

    fn response_token(fields: serde_json::Value) -> Token {
        Token {
            header: Header::RollResponse(RollResponseHeader {
                api_key: EncryptedApiKey { nonce: [1; 12], ciphertext: [2; 32] },
            }),
            footer: Footer::new(
                [3; 32],
                ClientId::from_bytes([4; 20]),
                SessionFields::try_from(fields).unwrap(),
            ),
        }
    }

    #[test]
    fn encoded_token_has_one_separator() {
        let wire = response_token(json!({"note": "a|b"})).encode();
        // base64 never emits '|', even when the JSON body contains one
        assert_eq!(wire.matches(SEPARATOR).count(), 1);
    }

    #[test]
    fn decode_response_round_trip() {
        let token = response_token(json!({"cart": {"apple": 2}}));
        assert_eq!(Token::decode_response(&token.encode()).unwrap(), token);
    }

    #[test]
    fn session_data_reads_fields_without_verification() {
        let token = response_token(json!({"cart": {"apple": 2}}));
        let fields = session_data(&token.encode()).unwrap();
        assert_eq!(fields.get("cart"), Some(&json!({"apple": 2})));
    }

    #[test]
    fn peek_client_id_reads_footer() {
        let wire = response_token(json!({})).encode();
        assert_eq!(peek_client_id(&wire).unwrap(), ClientId::from_bytes([4; 20]));
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert_eq!(Token::decode_response("AAAA"), Err(ProtocolError::MissingSeparator));
        assert_eq!(session_data("AAAA"), Err(ProtocolError::MissingSeparator));
    }

    #[test]
    fn bad_base64_names_the_segment() {
        let wire = response_token(json!({})).encode();
        let (header, _) = wire.split_once('|').unwrap();
        let broken = format!("{header}|***");
        assert_eq!(
            Token::decode_response(&broken),
            Err(ProtocolError::InvalidBase64 { segment: "footer" })
        );
    }

    #[test]
    fn request_keeps_forwarded_footer() {
        let response = response_token(json!({"cart": {"apple": 2}}));
        let wire = response.encode();
        let header = Header::RollRequest(crate::RollRequestHeader::new(vec![7; 100]).unwrap());

        let request = encode_with_footer(&header, footer_segment(&wire).unwrap());
        let decoded = Token::decode_request(&request).unwrap();

        assert_eq!(decoded.header, header);
        assert_eq!(decoded.footer, response.footer);
    }

    #[test]
    fn footer_segment_is_verbatim() {
        let wire = response_token(json!({"x": 1})).encode();
        let (_, footer) = wire.split_once('|').unwrap();
        assert_eq!(footer_segment(&wire).unwrap(), footer);
    }
}
