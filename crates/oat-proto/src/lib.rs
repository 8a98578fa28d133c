//! Wire format for OAT rolling authentication tokens.
//!
//! A token is two base64 segments joined by a literal `|`:
//!
//! ```text
//! base64(header) | base64(hmac[32] ++ client_id[20] ++ json(fields))
//! ```
//!
//! The header shape depends on direction and protocol phase:
//!
//! | Phase                   | Header bytes                                   |
//! |-------------------------|------------------------------------------------|
//! | Init response (S -> C)  | `server_box_public[32] ++ enc_api_key[44]`      |
//! | Roll request (C -> S)   | `signature[64] ++ api_key[32] ++ domain`        |
//! | Roll response (S -> C)  | `enc_api_key[44]`                               |
//!
//! Server-to-client headers are told apart by length (76 vs 44 bytes). That
//! length check happens exactly once, in [`Header::decode_response`]; callers
//! only ever see the tagged [`Header`] enum.
//!
//! This crate performs no cryptography. A decoded [`Footer`] carries an HMAC
//! that has NOT been checked; the authenticator in `oat-core` recomputes it
//! before any field is trusted.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client_id;
pub mod errors;
pub mod fields;
pub mod footer;
pub mod header;
pub mod init;
pub mod token;

pub use client_id::ClientId;
pub use errors::{ProtocolError, Result};
pub use fields::SessionFields;
pub use footer::Footer;
pub use header::{
    EncryptedApiKey, Header, InitResponseHeader, RollRequestHeader, RollResponseHeader,
};
pub use init::InitRequest;
pub use token::{SEPARATOR, Token, encode_with_footer, footer_segment, peek_client_id, session_data};
