//! Google Sheets / Drive pass-through proxy.
//!
//! Each route obtains a service-account-authenticated client and forwards
//! exactly one call to Google, returning the vendor body (or error) as JSON.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod api;
pub mod auth;
pub mod config;
pub mod credential;
pub mod error;
pub mod google;
pub mod routes;

pub use api::{SheetsApi, SheetsConnector, SpreadsheetSummary, ValueInputOption};
pub use auth::{ServiceAccountConnector, SCOPES};
pub use credential::ServiceAccount;
pub use error::{SheetsError, VendorError};
