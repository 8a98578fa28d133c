//! Server engine configuration.

use oat_crypto::ConfigError;

/// Settings for [`crate::OatServer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    domain: String,
}

impl ServerConfig {
    /// Configure the domain roll requests must be signed for.
    ///
    /// # Errors
    ///
    /// - `Missing`: the domain is empty or whitespace
    pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
        let domain = domain.into();
        if domain.trim().is_empty() {
            return Err(ConfigError::Missing("domain"));
        }
        Ok(Self { domain })
    }

    /// Domain this server answers for.
    pub fn domain(&self) -> &str {
        &self.domain
    }
}
