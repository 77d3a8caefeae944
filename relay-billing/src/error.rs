//! Error types for the billing proxy.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relay_core::RunMode;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

const REDACTED_PANIC: &str = "An unexpected error occurred";

/// The `error` object Stripe returns on non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripeError {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

/// Errors that can occur while handling a billing request.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BillingError {
    /// No Stripe secret key was configured at startup.
    #[error("Stripe is not configured: STRIPE_SECRET_KEY is not set")]
    NotConfigured,

    /// The request body could not be read or encoded.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Stripe answered with an error object.
    #[error("{}", .error.message)]
    Stripe { status: u16, error: StripeError },

    /// Stripe could not be reached or its response could not be read.
    #[error("Stripe request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The configured Stripe base URL is unusable.
    #[error("invalid Stripe API base URL: {0}")]
    Endpoint(String),
}

/// Body of every handled billing error.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BillingErrorBody {
    pub error: String,
    /// Stripe's machine-readable error code, when it sent one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl BillingError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            BillingError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn body(&self) -> BillingErrorBody {
        let code = match self {
            BillingError::Stripe { error, .. } => error.code.clone(),
            _ => None,
        };
        BillingErrorBody {
            error: self.to_string(),
            code,
        }
    }
}

impl IntoResponse for BillingError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// Body returned when a handler panics.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServerErrorBody {
    pub error: String,
    pub message: String,
}

/// Turn a caught panic into the `Server error` envelope.
///
/// The panic message only leaves the process in development mode.
#[must_use]
pub fn panic_response(mode: RunMode, panic: &(dyn Any + Send)) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "handler panicked");

    let message = if mode.is_development() {
        detail.to_owned()
    } else {
        REDACTED_PANIC.to_owned()
    };
    let body = ServerErrorBody {
        error: "Server error".to_owned(),
        message,
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
