//! Runtime configuration for the sheets proxy.

use relay_core::{ConfigError, ListenConfig};

use crate::credential::CREDENTIAL_VAR;

/// Everything the binary reads from the environment.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub listen: ListenConfig,
    /// Raw `GOOGLE_SERVICE_ACCOUNT` value; parsed later by [`crate::credential::load`].
    pub service_account: Option<String>,
}

impl SheetsConfig {
    /// # Errors
    /// Returns [`ConfigError`] if the listen address is malformed.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            listen: ListenConfig::from_lookup(lookup)?,
            service_account: lookup(CREDENTIAL_VAR),
        })
    }
}
