//! Shared plumbing for the relay vendor proxies.
//!
//! Configuration lookup, logging setup, the JSON error envelope, the ordered
//! request filter chain with its two filters (fixed-window rate limiting and
//! the API-key gate), hardened response headers, and the listener loop.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod api_key;
pub mod config;
pub mod error;
pub mod filter;
pub mod headers;
pub mod rate_limit;
pub mod server;
pub mod telemetry;

pub use api_key::ApiKeyGate;
pub use config::{env_lookup, ListenConfig, RunMode};
pub use error::{error_response, ConfigError, ErrorBody};
pub use filter::{FilterChain, RequestFilter, Verdict};
pub use rate_limit::{FixedWindowLimiter, RateLimitConfig};
pub use telemetry::{init_logging, LogFormat};
