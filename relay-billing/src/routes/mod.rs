//! Axum route handlers for the billing proxy.
//!
//! Every resource handler makes exactly one [`BillingApi`] call and returns
//! Stripe's object verbatim.

pub mod customers;
pub mod invoices;
pub mod payments;

use std::sync::Arc;

use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::BillingError,
    stripe::{BillingApi, BillingResource},
};

// ── Shared state ─────────────────────────────────────────────────────────────

/// Read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    billing: Option<Arc<dyn BillingApi>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("billing_configured", &self.billing.is_some())
            .finish()
    }
}

impl AppState {
    /// `billing` is `None` when no Stripe key was configured; resource routes
    /// then answer with [`BillingError::NotConfigured`].
    #[must_use]
    pub fn new(billing: Option<Arc<dyn BillingApi>>) -> Self {
        Self { billing }
    }

    fn billing(&self) -> Result<&dyn BillingApi, BillingError> {
        self.billing.as_deref().ok_or(BillingError::NotConfigured)
    }
}

// ── Shared documentation types ───────────────────────────────────────────────

/// Stripe list envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct StripeList {
    /// Always `list`.
    pub object: String,
    pub url: String,
    pub has_more: bool,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Value>,
}

/// Pagination parameters Stripe accepts on every list endpoint. Any other
/// query parameter is forwarded as well.
#[derive(Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Page size, 1 to 100.
    pub limit: Option<u8>,
    /// Cursor: return objects after this id.
    pub starting_after: Option<String>,
    /// Cursor: return objects before this id.
    pub ending_before: Option<String>,
}

// ── Delegation ───────────────────────────────────────────────────────────────

async fn create(
    state: &AppState,
    resource: BillingResource,
    params: &Value,
) -> Result<Json<Value>, BillingError> {
    let object = state
        .billing()?
        .create(resource, params)
        .await
        .inspect_err(log_failure(resource, "create"))?;
    Ok(Json(object))
}

async fn list(
    state: &AppState,
    resource: BillingResource,
    query: Option<&str>,
) -> Result<Json<Value>, BillingError> {
    let page = state
        .billing()?
        .list(resource, query)
        .await
        .inspect_err(log_failure(resource, "list"))?;
    Ok(Json(page))
}

async fn retrieve(
    state: &AppState,
    resource: BillingResource,
    id: &str,
) -> Result<Json<Value>, BillingError> {
    let object = state
        .billing()?
        .retrieve(resource, id)
        .await
        .inspect_err(log_failure(resource, "retrieve"))?;
    Ok(Json(object))
}

fn log_failure(resource: BillingResource, action: &'static str) -> impl Fn(&BillingError) {
    move |e| warn!(resource = %resource, action, error = %e, "stripe call failed")
}
