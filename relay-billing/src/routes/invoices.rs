//! Invoice endpoints.

use std::collections::HashMap;

use axum::{
    extract::{Path, RawQuery, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::{AppState, ListParams, StripeList};
use crate::{
    error::{BillingError, BillingErrorBody},
    extract::Payload,
    stripe::BillingResource,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/invoices", post(create_invoice).get(list_invoices))
        .route("/api/v1/invoices/{id}", get(get_invoice))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceParams {
    /// Customer to bill.
    pub customer: String,
    pub description: Option<String>,
    /// `charge_automatically` or `send_invoice`.
    pub collection_method: Option<String>,
    /// Required with `send_invoice`.
    pub days_until_due: Option<u32>,
    pub auto_advance: Option<bool>,
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Invoice {
    pub id: String,
    pub object: String,
    pub customer: String,
    /// `draft`, `open`, `paid`, `uncollectible` or `void`.
    pub status: Option<String>,
    /// Smallest currency unit.
    pub amount_due: i64,
    pub currency: String,
    pub created: i64,
    pub hosted_invoice_url: Option<String>,
}

/// Create a draft invoice.
#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    tag = "Invoices",
    request_body(
        content = InvoiceParams,
        description = "JSON or application/x-www-form-urlencoded"
    ),
    responses(
        (status = 200, description = "The created invoice", body = Invoice),
        (status = 400, description = "Unreadable body", body = BillingErrorBody),
        (status = 401, description = "Missing or wrong API key", body = BillingErrorBody),
        (status = 429, description = "Rate limit exceeded", body = BillingErrorBody),
        (status = 500, description = "Stripe error", body = BillingErrorBody),
    ),
    security(("apiKey" = []))
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    Payload(params): Payload,
) -> Result<Json<Value>, BillingError> {
    super::create(&state, BillingResource::Invoices, &params).await
}

/// List invoices. Stripe filters such as `customer` or `status` pass through.
#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    tag = "Invoices",
    params(ListParams),
    responses(
        (status = 200, description = "A page of invoices", body = StripeList),
        (status = 401, description = "Missing or wrong API key", body = BillingErrorBody),
        (status = 500, description = "Stripe error", body = BillingErrorBody),
    ),
    security(("apiKey" = []))
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, BillingError> {
    super::list(&state, BillingResource::Invoices, query.as_deref()).await
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    tag = "Invoices",
    params(("id" = String, Path, description = "Stripe invoice id")),
    responses(
        (status = 200, description = "The invoice", body = Invoice),
        (status = 401, description = "Missing or wrong API key", body = BillingErrorBody),
        (status = 500, description = "Stripe error, including unknown ids", body = BillingErrorBody),
    ),
    security(("apiKey" = []))
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, BillingError> {
    super::retrieve(&state, BillingResource::Invoices, &id).await
}
