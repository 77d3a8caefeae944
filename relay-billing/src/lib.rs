//! Stripe billing pass-through proxy.
//!
//! Customers, invoices and payments are forwarded one call each to Stripe's
//! REST API behind an API-key gate and a fixed-window rate limiter, with an
//! OpenAPI document and Swagger UI under `/api`.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod extract;
pub mod openapi;
pub mod router;
pub mod routes;
pub mod stripe;

pub use error::{BillingError, StripeError};
pub use router::build_router;
pub use routes::AppState;
pub use stripe::{BillingApi, BillingResource, StripeClient};
