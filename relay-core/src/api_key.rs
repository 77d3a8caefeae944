//! Shared-secret header gate.

use axum::{
    extract::Request,
    http::{HeaderName, StatusCode},
};

use crate::{
    error::error_response,
    filter::{RequestFilter, Verdict},
};

/// Header the billing proxy expects the secret in.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Rejects requests whose key header is absent or differs from the configured secret.
///
/// With no secret configured every request is rejected.
#[derive(Clone)]
pub struct ApiKeyGate {
    header: HeaderName,
    secret: Option<String>,
}

impl std::fmt::Debug for ApiKeyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGate")
            .field("header", &self.header)
            .field("configured", &self.secret.is_some())
            .finish()
    }
}

impl ApiKeyGate {
    #[must_use]
    pub fn new(secret: Option<String>) -> Self {
        Self::with_header(API_KEY_HEADER, secret)
    }

    #[must_use]
    pub fn with_header(header: HeaderName, secret: Option<String>) -> Self {
        let secret = secret.filter(|s| !s.is_empty());
        if secret.is_none() {
            tracing::warn!(header = %header, "no API key configured; all requests will be rejected");
        }
        Self { header, secret }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    fn accepts(&self, presented: Option<&[u8]>) -> bool {
        match (&self.secret, presented) {
            (Some(secret), Some(key)) => constant_time_eq(secret.as_bytes(), key),
            _ => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl RequestFilter for ApiKeyGate {
    fn name(&self) -> &'static str {
        "api_key"
    }

    fn check(&self, request: &Request) -> Verdict {
        let presented = request.headers().get(&self.header).map(|v| v.as_bytes());
        if self.accepts(presented) {
            Verdict::Continue
        } else {
            Verdict::Reject(error_response(StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(key: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/api/v1/customers");
        if let Some(k) = key {
            builder = builder.header("x-api-key", k);
        }
        match builder.body(Body::empty()) {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        }
    }

    fn is_rejected(verdict: &Verdict) -> bool {
        matches!(verdict, Verdict::Reject(resp) if resp.status() == StatusCode::UNAUTHORIZED)
    }

    #[test]
    fn matching_key_continues() {
        let gate = ApiKeyGate::new(Some("s3cret".to_owned()));
        assert!(matches!(gate.check(&request(Some("s3cret"))), Verdict::Continue));
    }

    #[test]
    fn missing_or_wrong_key_is_unauthorized() {
        let gate = ApiKeyGate::new(Some("s3cret".to_owned()));
        assert!(is_rejected(&gate.check(&request(None))));
        assert!(is_rejected(&gate.check(&request(Some("s3cre")))));
        assert!(is_rejected(&gate.check(&request(Some("s3cret!")))));
    }

    #[test]
    fn unconfigured_gate_rejects_everything() {
        let gate = ApiKeyGate::new(None);
        assert!(!gate.is_configured());
        assert!(is_rejected(&gate.check(&request(Some("")))));
        assert!(is_rejected(&gate.check(&request(Some("anything")))));

        let empty = ApiKeyGate::new(Some(String::new()));
        assert!(!empty.is_configured(), "empty secret must count as unconfigured");
    }
}
