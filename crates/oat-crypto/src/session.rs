//! Session field MAC
//!
//! The footer carries `HMAC-SHA3-256(k, client_id ‖ fields_json ‖ api_key)`
//! where `k` is a server-only subkey. Including the api key ties the fields
//! to one ratchet generation.

use subtle::ConstantTimeEq;

use crate::keys::{ApiKey, hmac_sha3};

/// Label for the master-key subkey that keys the footer MAC.
pub const SESSION_MAC_LABEL: &[u8] = b"oatSessionFieldsV1";

/// Compute the footer MAC.
pub fn session_mac(mac_key: &[u8; 32], client_id: &[u8; 20], fields_json: &[u8], api_key: &ApiKey) -> [u8; 32] {
    hmac_sha3(mac_key, &[client_id, fields_json, api_key.as_bytes()])
}

/// Recompute the footer MAC and compare in constant time.
pub fn verify_session_mac(
    mac_key: &[u8; 32],
    client_id: &[u8; 20],
    fields_json: &[u8],
    api_key: &ApiKey,
    expected: &[u8; 32],
) -> bool {
    session_mac(mac_key, client_id, fields_json, api_key).ct_eq(expected).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC_KEY: [u8; 32] = [1; 32];
    const CLIENT: [u8; 20] = [2; 20];

    #[test]
    fn verifies_own_mac() {
        let key = ApiKey::from_bytes([3; 32]);
        let mac = session_mac(&MAC_KEY, &CLIENT, br#"{"user":1}"#, &key);
        assert!(verify_session_mac(&MAC_KEY, &CLIENT, br#"{"user":1}"#, &key, &mac));
    }

    #[test]
    fn every_input_is_bound() {
        let key = ApiKey::from_bytes([3; 32]);
        let fields = br#"{"user":1}"#;
        let mac = session_mac(&MAC_KEY, &CLIENT, fields, &key);

        assert!(!verify_session_mac(&[9; 32], &CLIENT, fields, &key, &mac));
        assert!(!verify_session_mac(&MAC_KEY, &[9; 20], fields, &key, &mac));
        assert!(!verify_session_mac(&MAC_KEY, &CLIENT, br#"{"user":2}"#, &key, &mac));
        assert!(!verify_session_mac(&MAC_KEY, &CLIENT, fields, &ApiKey::from_bytes([4; 32]), &mac));
    }
}
