//! Deployment configuration read from the process environment.
//!
//! | Variable           | Meaning                          | Default     |
//! |--------------------|----------------------------------|-------------|
//! | `OAT_PASS`         | Vault password (required)        |             |
//! | `OAT_DB`           | Redb database path               | `oat.redb`  |
//! | `OAT_DOMAIN`       | Domain this server answers for   | unset       |
//! | `OAT_MIN_PASS_LEN` | Minimum vault password length    | 16          |
//!
//! Loading goes through a lookup function so tests can supply variables
//! without touching the real environment.

use std::path::PathBuf;

use oat_core::ServerConfig;
use oat_crypto::{ConfigError, Vault, VaultConfig};

/// Vault password variable.
pub const PASS_VAR: &str = "OAT_PASS";
/// Database path variable.
pub const DB_VAR: &str = "OAT_DB";
/// Server domain variable.
pub const DOMAIN_VAR: &str = "OAT_DOMAIN";
/// Minimum password length variable.
pub const MIN_PASS_LEN_VAR: &str = "OAT_MIN_PASS_LEN";

/// Database path used when `OAT_DB` is unset.
pub const DEFAULT_DB_PATH: &str = "oat.redb";

/// Settings for a keystore-backed deployment.
#[derive(Debug, Clone)]
pub struct KeystoreConfig {
    /// Vault settings (password and minimum length)
    pub vault: VaultConfig,
    /// Where the redb database lives
    pub db_path: PathBuf,
    /// Domain served, if this process acts as a server
    pub domain: Option<String>,
}

impl KeystoreConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    ///
    /// The password length is checked here, so a returned config always
    /// yields a vault.
    ///
    /// # Errors
    ///
    /// - `Missing("OAT_PASS")`: no password
    /// - `Invalid`: `OAT_MIN_PASS_LEN` is not a number
    /// - `PasswordTooShort`: password below the minimum length
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let password = lookup(PASS_VAR).ok_or(ConfigError::Missing(PASS_VAR))?;

        let mut vault = VaultConfig::new(password);
        if let Some(raw) = lookup(MIN_PASS_LEN_VAR) {
            let min_len = raw.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
                field: MIN_PASS_LEN_VAR,
                reason: e.to_string(),
            })?;
            vault = vault.with_min_len(min_len);
        }
        Vault::new(&vault)?;

        let db_path = lookup(DB_VAR)
            .filter(|path| !path.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from);

        let domain = lookup(DOMAIN_VAR).filter(|domain| !domain.trim().is_empty());

        Ok(Self { vault, db_path, domain })
    }

    /// Vault keyed by the configured password.
    pub fn vault(&self) -> Result<Vault, ConfigError> {
        Vault::new(&self.vault)
    }

    /// Server settings for the configured domain.
    ///
    /// # Errors
    ///
    /// - `Missing("OAT_DOMAIN")`: no domain configured
    pub fn server_config(&self) -> Result<ServerConfig, ConfigError> {
        let domain = self.domain.as_deref().ok_or(ConfigError::Missing(DOMAIN_VAR))?;
        ServerConfig::new(domain)
    }
}
