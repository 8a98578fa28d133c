//! Fuzz target for token string decoding
//!
//! Feeds arbitrary text to every entry point that parses a wire token:
//! request and response decoding, the init request, and the untrusted
//! footer peeks.
//!
//! # Invariants
//!
//! - NEVER panic on malformed input; every rejection is a `ProtocolError`
//! - A token that decodes re-encodes to a token that decodes to the same value
//! - The peeks agree with full decoding whenever full decoding succeeds

#![no_main]

use libfuzzer_sys::fuzz_target;
use oat_proto::{ClientId, InitRequest, ProtocolError, SessionFields, Token, peek_client_id, session_data};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    let _ = InitRequest::decode(&text);
    let peeked_id = peek_client_id(&text);
    let peeked_fields = session_data(&text);

    if let Ok(token) = Token::decode_request(&text) {
        check_peeks(&token, &peeked_id, &peeked_fields);
        assert_eq!(Token::decode_request(&token.encode()).ok(), Some(token));
    }

    if let Ok(token) = Token::decode_response(&text) {
        check_peeks(&token, &peeked_id, &peeked_fields);
        assert_eq!(Token::decode_response(&token.encode()).ok(), Some(token));
    }
});

fn check_peeks(
    token: &Token,
    peeked_id: &Result<ClientId, ProtocolError>,
    peeked_fields: &Result<SessionFields, ProtocolError>,
) {
    assert_eq!(peeked_id.as_ref().ok(), Some(&token.footer.client_id()));
    assert_eq!(peeked_fields.as_ref().ok(), Some(token.footer.fields()));
}
