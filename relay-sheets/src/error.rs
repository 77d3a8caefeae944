//! Error types for the sheets proxy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

/// A failure reported by a Google endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorError {
    /// Human-readable message from the vendor.
    pub message: String,
    /// Numeric error code (Google mirrors the HTTP status here).
    pub code: Option<i64>,
    /// Canonical status name, e.g. `PERMISSION_DENIED`.
    pub status: Option<String>,
    /// The vendor's `errors` array, when present.
    pub errors: Option<Value>,
}

/// Errors that can occur while handling a sheets request.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SheetsError {
    /// No usable service-account credential was loaded at startup.
    #[error("GOOGLE_SERVICE_ACCOUNT environment variable is not set or is invalid")]
    NotConfigured,

    /// The request body or query is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The assertion could not be signed.
    #[error("failed to sign service account assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// The HTTP exchange with Google failed before a response arrived.
    #[error("request to Google failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A configured Google endpoint is not a usable base URL.
    #[error("invalid endpoint '{0}'")]
    Endpoint(String),

    /// Google answered with an error.
    #[error("{}", .0.message)]
    Vendor(VendorError),
}

impl SheetsError {
    fn status_code(&self) -> StatusCode {
        match self {
            SheetsError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Attach vendor diagnostics and a remediation hint to the response.
    #[must_use]
    pub fn with_tip(self, tip: &'static str) -> DetailedError {
        DetailedError { error: self, tip }
    }
}

impl IntoResponse for SheetsError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({"error": self.to_string()}))).into_response()
    }
}

/// A [`SheetsError`] rendered with `details` and `tip` fields.
#[derive(Debug)]
pub struct DetailedError {
    error: SheetsError,
    tip: &'static str,
}

impl DetailedError {
    fn details(&self) -> Value {
        let message = self.error.to_string();
        match &self.error {
            SheetsError::Vendor(v) => json!({
                "message": message,
                "code": v.code,
                "status": v.status,
                "details": v.errors.clone().unwrap_or_else(|| json!("No detailed errors")),
            }),
            _ => json!({
                "message": message,
                "code": null,
                "status": null,
                "details": "No detailed errors",
            }),
        }
    }
}

impl IntoResponse for DetailedError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error.to_string(),
            "details": self.details(),
            "tip": self.tip,
        });
        (self.error.status_code(), Json(body)).into_response()
    }
}
