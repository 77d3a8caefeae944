//! Environment-driven configuration helpers.
//!
//! Every service reads its settings through a lookup function rather than
//! touching `std::env` directly, so tests can feed a plain map.

use std::{
    fmt::Display,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    str::FromStr,
};

use crate::error::ConfigError;

/// Default listen port shared by both proxies.
pub const DEFAULT_PORT: u16 = 3000;

/// Read a variable from the process environment, treating empty values as unset.
#[must_use]
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Load a `.env` file from the working directory if one exists.
///
/// Returns `true` when a file was loaded. A missing file is not an error.
pub fn load_dotenv() -> bool {
    dotenvy::dotenv().is_ok()
}

/// Parse `key` with `FromStr`, falling back to `default` when unset.
///
/// # Errors
/// Returns [`ConfigError::InvalidValue`] if the variable is set but does not parse.
pub fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw,
            reason: e.to_string(),
        }),
    }
}

/// Deployment mode. Controls how much error detail leaves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    Development,
    #[default]
    Production,
}

impl RunMode {
    /// Anything other than `development` (case-insensitive) is production.
    #[must_use]
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("development") => Self::Development,
            _ => Self::Production,
        }
    }

    #[must_use]
    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

/// Socket the HTTP server binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenConfig {
    pub bind: IpAddr,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

impl ListenConfig {
    /// Read `BIND_ADDR` and `PORT`.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if either variable is malformed.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            bind: parse_or(lookup, "BIND_ADDR", defaults.bind)?,
            port: parse_or(lookup, "PORT", defaults.port)?,
        })
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}
