//! Fixed-window request limiter keyed by client source.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use axum::{
    extract::Request,
    http::{header, HeaderValue, StatusCode},
};

use crate::{
    config::parse_or,
    error::{error_response, ConfigError},
    filter::{client_source, RequestFilter, Verdict},
};

/// 15 minutes.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_MAX_REQUESTS: u32 = 100;

const LIMITED_MESSAGE: &str = "Too many requests, please try again later.";

/// Table size that triggers the first sweep of expired windows.
pub const PRUNE_THRESHOLD: usize = 1024;

/// Window length and per-window ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            max_requests: DEFAULT_MAX_REQUESTS,
        }
    }
}

impl RateLimitConfig {
    /// Read `RATE_LIMIT_WINDOW_SECS` and `RATE_LIMIT_MAX`.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if a value is malformed or zero.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let window_secs: u64 = parse_or(lookup, "RATE_LIMIT_WINDOW_SECS", DEFAULT_WINDOW.as_secs())?;
        let max_requests: u32 = parse_or(lookup, "RATE_LIMIT_MAX", DEFAULT_MAX_REQUESTS)?;
        if window_secs == 0 {
            return Err(zero("RATE_LIMIT_WINDOW_SECS"));
        }
        if max_requests == 0 {
            return Err(zero("RATE_LIMIT_MAX"));
        }
        Ok(Self {
            window: Duration::from_secs(window_secs),
            max_requests,
        })
    }
}

fn zero(key: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: "0".to_owned(),
        reason: "must be greater than zero".to_owned(),
    }
}

/// Result of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
struct Table {
    windows: HashMap<String, Window>,
    /// Sweep expired windows once `windows` grows to this size.
    prune_at: usize,
}

/// In-memory fixed-window counter per client source.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    config: RateLimitConfig,
    table: Mutex<Table>,
}

impl FixedWindowLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            table: Mutex::new(Table {
                windows: HashMap::new(),
                prune_at: PRUNE_THRESHOLD,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Count one request from `key` at the current instant.
    pub fn record(&self, key: &str) -> Decision {
        self.record_at(key, Instant::now())
    }

    /// Count one request from `key` at `now`.
    ///
    /// An expired window for `key` restarts at `now`. Other expired windows are
    /// swept only when the table reaches its prune size, which then doubles
    /// relative to the survivors.
    ///
    /// # Panics
    /// Panics if the internal `Mutex` is poisoned.
    pub fn record_at(&self, key: &str, now: Instant) -> Decision {
        let window = self.config.window;
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut table = self.table.lock().expect("rate limiter lock poisoned");

        if !table.windows.contains_key(key) && table.windows.len() >= table.prune_at {
            table
                .windows
                .retain(|_, w| now.saturating_duration_since(w.started) < window);
            table.prune_at = PRUNE_THRESHOLD.max(table.windows.len() * 2);
        }

        let entry = table
            .windows
            .entry(key.to_owned())
            .or_insert(Window { started: now, count: 0 });
        if now.saturating_duration_since(entry.started) >= window {
            *entry = Window { started: now, count: 0 };
        }

        if entry.count >= self.config.max_requests {
            let elapsed = now.saturating_duration_since(entry.started);
            return Decision::Limited {
                retry_after: window.saturating_sub(elapsed),
            };
        }
        entry.count += 1;
        Decision::Allowed {
            remaining: self.config.max_requests - entry.count,
        }
    }

    /// Number of sources in the table. Expired windows stay until the next
    /// sweep.
    ///
    /// # Panics
    /// Panics if the internal `Mutex` is poisoned.
    #[must_use]
    pub fn tracked_sources(&self) -> usize {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let table = self.table.lock().expect("rate limiter lock poisoned");
        table.windows.len()
    }
}

impl RequestFilter for FixedWindowLimiter {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn check(&self, request: &Request) -> Verdict {
        let source = client_source(request);
        match self.record(&source) {
            Decision::Allowed { .. } => Verdict::Continue,
            Decision::Limited { retry_after } => {
                tracing::warn!(source = %source, "rate limit exceeded");
                let mut response = error_response(StatusCode::TOO_MANY_REQUESTS, LIMITED_MESSAGE);
                // Round up so clients never retry inside the closed window.
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                Verdict::Reject(response)
            }
        }
    }
}
