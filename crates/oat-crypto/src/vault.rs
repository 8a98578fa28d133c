//! Password-keyed vault for secrets at rest
//!
//! The vault master key is SHA3-256 of the configured password. Every
//! persisted secret (shared keys, signing keys, api keys) is sealed with it.
//! Purpose-specific keys are derived from the master key with HMAC-SHA3-256
//! over a fixed label so that the master key itself never keys a MAC.

use std::fmt;

use sha3::{Digest, Sha3_256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::{
    aead::{self, NONCE_SIZE},
    error::{ConfigError, CryptoError},
    keys::hmac_sha3,
    ratchet::ISSUANCE_LABEL,
    session::SESSION_MAC_LABEL,
};

/// Vault settings.
#[derive(Clone)]
pub struct VaultConfig {
    password: Zeroizing<String>,
    min_len: usize,
}

impl VaultConfig {
    /// Shortest password accepted unless overridden.
    pub const DEFAULT_MIN_LEN: usize = 16;

    /// Configure a vault with the default minimum password length.
    pub fn new(password: impl Into<String>) -> Self {
        Self { password: Zeroizing::new(password.into()), min_len: Self::DEFAULT_MIN_LEN }
    }

    /// Override the minimum password length.
    #[must_use]
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }

    /// Minimum password length in bytes.
    pub fn min_len(&self) -> usize {
        self.min_len
    }
}

impl fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConfig")
            .field("password", &"<redacted>")
            .field("min_len", &self.min_len)
            .finish()
    }
}

/// SHA3-256 of the vault password.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; 32]);

impl MasterKey {
    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derive a purpose-specific 32-byte key: `HMAC-SHA3-256(master, label)`.
    pub fn subkey(&self, label: &[u8]) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(hmac_sha3(&self.0, &[label]))
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

/// Hash a password into a master key.
///
/// # Errors
///
/// - `PasswordTooShort`: fewer than `min_len` bytes (an empty password is
///   always rejected)
pub fn derive_master_key(password: &[u8], min_len: usize) -> Result<MasterKey, ConfigError> {
    if password.is_empty() || password.len() < min_len {
        return Err(ConfigError::PasswordTooShort { min: min_len, actual: password.len() });
    }

    let digest = Sha3_256::digest(password);
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    Ok(MasterKey(key))
}

/// Seals and opens secrets under the master key.
#[derive(Clone, Debug)]
pub struct Vault {
    master: MasterKey,
}

impl Vault {
    /// Derive the master key from `config`.
    pub fn new(config: &VaultConfig) -> Result<Self, ConfigError> {
        let master = derive_master_key(config.password.as_bytes(), config.min_len)?;
        Ok(Self { master })
    }

    /// Wrap an already-derived master key.
    pub fn from_master_key(master: MasterKey) -> Self {
        Self { master }
    }

    /// Encrypt `plaintext` under the master key with a caller-supplied nonce.
    ///
    /// Output is `nonce(12) ‖ ciphertext ‖ tag(16)`.
    pub fn seal(&self, nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> Vec<u8> {
        aead::seal(self.master.as_bytes(), nonce, plaintext)
    }

    /// Decrypt a sealed blob.
    pub fn open(&self, blob: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        aead::open(self.master.as_bytes(), blob)
    }

    /// Decrypt a sealed blob that must hold exactly 32 bytes.
    pub fn open_key(&self, blob: &[u8]) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
        let plaintext = self.open(blob)?;
        let key: [u8; 32] = plaintext.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidKeyLength { expected: 32, actual: plaintext.len() }
        })?;
        Ok(Zeroizing::new(key))
    }

    /// Key for the footer session-field MAC.
    pub fn session_mac_key(&self) -> Zeroizing<[u8; 32]> {
        self.master.subkey(SESSION_MAC_LABEL)
    }

    /// Key for minting first-generation api keys.
    pub fn issuance_key(&self) -> Zeroizing<[u8; 32]> {
        self.master.subkey(ISSUANCE_LABEL)
    }
}
