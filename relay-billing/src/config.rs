//! Runtime configuration for the billing proxy.

use relay_core::{ConfigError, ListenConfig, RateLimitConfig, RunMode};

pub const DEFAULT_STRIPE_BASE: &str = "https://api.stripe.com";

/// Everything the binary reads from the environment.
#[derive(Clone)]
pub struct BillingConfig {
    pub listen: ListenConfig,
    /// Shared secret callers must present in `x-api-key`.
    pub api_key: Option<String>,
    pub stripe_secret: Option<String>,
    pub stripe_base: String,
    /// Public base URL advertised in the OpenAPI `servers` list.
    pub host_url: String,
    pub run_mode: RunMode,
    pub rate_limit: RateLimitConfig,
}

impl std::fmt::Debug for BillingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingConfig")
            .field("listen", &self.listen)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("stripe_secret", &self.stripe_secret.as_ref().map(|_| "<redacted>"))
            .field("stripe_base", &self.stripe_base)
            .field("host_url", &self.host_url)
            .field("run_mode", &self.run_mode)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

impl BillingConfig {
    /// Read `API_KEY_SECRET`, `STRIPE_SECRET_KEY`, `STRIPE_API_BASE`,
    /// `HOST_URL`, `APP_ENV`, the listen address and the rate limit.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if a numeric variable is malformed.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen = ListenConfig::from_lookup(lookup)?;
        let host_url = lookup("HOST_URL")
            .map_or_else(|| format!("http://localhost:{}", listen.port), |u| {
                u.trim_end_matches('/').to_owned()
            });
        Ok(Self {
            listen,
            api_key: lookup("API_KEY_SECRET"),
            stripe_secret: lookup("STRIPE_SECRET_KEY"),
            stripe_base: lookup("STRIPE_API_BASE").unwrap_or_else(|| DEFAULT_STRIPE_BASE.to_owned()),
            host_url,
            run_mode: RunMode::from_value(lookup("APP_ENV").as_deref()),
            rate_limit: RateLimitConfig::from_lookup(lookup)?,
        })
    }
}
