//! Fuzz target for raw header and footer bytes
//!
//! Skips the base64 layer and hands arbitrary bytes straight to the header
//! and footer decoders, so length checks and the JSON field parser see
//! inputs base64 would rarely produce.
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use oat_proto::{Footer, Header};

fuzz_target!(|data: &[u8]| {
    let _ = Header::decode_request(data);

    if let Ok(header) = Header::decode_response(data) {
        assert_eq!(header.to_bytes(), data);
    }

    if let Ok(footer) = Footer::from_bytes(data) {
        let again = Footer::from_bytes(&footer.to_bytes()).ok();
        assert_eq!(again, Some(footer));
    }
});
