//! Ordered request filters.
//!
//! A [`FilterChain`] runs each [`RequestFilter`] in registration order. The
//! first filter that rejects ends the chain and its response is returned
//! without the remaining filters or the route handler ever running.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Outcome of a single filter.
#[derive(Debug)]
pub enum Verdict {
    Continue,
    Reject(Response),
}

/// A synchronous gate evaluated before routing.
pub trait RequestFilter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Inspect the request head and decide whether it may proceed.
    fn check(&self, request: &Request) -> Verdict;
}

/// Immutable, cheaply clonable list of filters.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn RequestFilter>>,
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.filters.iter().map(|flt| flt.name()))
            .finish()
    }
}

impl FilterChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter. Filters run in the order they are added.
    #[must_use]
    pub fn with<F: RequestFilter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run every filter until one rejects.
    pub fn run(&self, request: &Request) -> Verdict {
        for filter in &self.filters {
            if let Verdict::Reject(response) = filter.check(request) {
                debug!(
                    filter = filter.name(),
                    method = %request.method(),
                    path = request.uri().path(),
                    status = %response.status(),
                    "request rejected"
                );
                return Verdict::Reject(response);
            }
        }
        Verdict::Continue
    }
}

/// Axum middleware adapter: `middleware::from_fn_with_state(chain, apply_filters)`.
pub async fn apply_filters(
    State(chain): State<FilterChain>,
    request: Request,
    next: Next,
) -> Response {
    match chain.run(&request) {
        Verdict::Continue => next.run(request).await,
        Verdict::Reject(response) => response,
    }
}

/// Identify the caller for per-source accounting.
///
/// Uses the peer address when the server was started with connect info,
/// otherwise the first `x-forwarded-for` hop, otherwise `"unknown"`.
#[must_use]
pub fn client_source(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(|| "unknown".to_owned(), str::to_owned)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{body::Body, http::StatusCode};

    use super::*;
    use crate::error::error_response;

    struct Counting {
        name: &'static str,
        calls: Arc<AtomicUsize>,
        reject: bool,
    }

    impl RequestFilter for Counting {
        fn name(&self) -> &'static str {
            self.name
        }

        fn check(&self, _request: &Request) -> Verdict {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                Verdict::Reject(error_response(StatusCode::FORBIDDEN, self.name))
            } else {
                Verdict::Continue
            }
        }
    }

    fn request() -> Request {
        match Request::builder().uri("/").body(Body::empty()) {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        }
    }

    #[test]
    fn filter_chain_stops_at_first_rejection() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let third = Arc::new(AtomicUsize::new(0));
        let chain = FilterChain::new()
            .with(Counting { name: "first", calls: Arc::clone(&first), reject: false })
            .with(Counting { name: "second", calls: Arc::clone(&second), reject: true })
            .with(Counting { name: "third", calls: Arc::clone(&third), reject: false });

        match chain.run(&request()) {
            Verdict::Reject(resp) => assert_eq!(resp.status(), StatusCode::FORBIDDEN),
            Verdict::Continue => panic!("chain should have rejected"),
        }
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(third.load(Ordering::SeqCst), 0, "filters after a rejection must not run");
    }

    #[test]
    fn empty_chain_continues() {
        let chain = FilterChain::new();
        assert!(chain.is_empty());
        assert!(matches!(chain.run(&request()), Verdict::Continue));
    }

    #[test]
    fn client_source_prefers_forwarded_header_without_peer() {
        let req = match Request::builder()
            .uri("/")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
        {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        assert_eq!(client_source(&req), "203.0.113.7");
        assert_eq!(client_source(&request()), "unknown");
    }

    #[test]
    fn client_source_uses_peer_address_when_known() {
        let mut req = request();
        let addr: SocketAddr = match "192.0.2.10:5555".parse() {
            Ok(a) => a,
            Err(e) => panic!("bad addr: {e}"),
        };
        req.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(client_source(&req), "192.0.2.10");
    }
}
