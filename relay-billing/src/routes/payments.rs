//! Payment endpoints, backed by Stripe payment intents.

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
        .route("/api/v1/payments", post(create_payment).get(list_payments))
        .route("/api/v1/payments/{id}", get(get_payment))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentParams {
    /// Smallest currency unit, e.g. cents.
    pub amount: i64,
    /// Three-letter ISO code, lowercase.
    pub currency: String,
    pub customer: Option<String>,
    pub description: Option<String>,
    pub payment_method_types: Option<Vec<String>>,
    pub metadata: Option<HashMap<String, String>>,
}

/// Subset of the Stripe payment intent object.
#[derive(Debug, Serialize, ToSchema)]
pub struct Payment {
    /// `pi_...`
    pub id: String,
    pub object: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub customer: Option<String>,
    pub client_secret: Option<String>,
    pub created: i64,
}

/// Create a payment intent.
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "Payments",
    request_body(
        content = PaymentParams,
        description = "JSON or application/x-www-form-urlencoded"
    ),
    responses(
        (status = 200, description = "The created payment intent", body = Payment),
        (status = 400, description = "Unreadable body", body = BillingErrorBody),
        (status = 401, description = "Missing or wrong API key", body = BillingErrorBody),
        (status = 429, description = "Rate limit exceeded", body = BillingErrorBody),
        (status = 500, description = "Stripe error", body = BillingErrorBody),
    ),
    security(("apiKey" = []))
)]
pub async fn create_payment(
    State(state): State<AppState>,
    Payload(params): Payload,
) -> Result<Json<Value>, BillingError> {
    super::create(&state, BillingResource::Payments, &params).await
}

/// List payment intents.
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    tag = "Payments",
    params(ListParams),
    responses(
        (status = 200, description = "A page of payment intents", body = StripeList),
        (status = 401, description = "Missing or wrong API key", body = BillingErrorBody),
        (status = 500, description = "Stripe error", body = BillingErrorBody),
    ),
    security(("apiKey" = []))
)]
pub async fn list_payments(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, BillingError> {
    super::list(&state, BillingResource::Payments, query.as_deref()).await
}

/// Retrieve a payment intent.
#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}",
    tag = "Payments",
    params(("id" = String, Path, description = "Stripe payment intent id")),
    responses(
        (status = 200, description = "The payment intent", body = Payment),
        (status = 401, description = "Missing or wrong API key", body = BillingErrorBody),
        (status = 500, description = "Stripe error, including unknown ids", body = BillingErrorBody),
    ),
    security(("apiKey" = []))
)]
pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, BillingError> {
    super::retrieve(&state, BillingResource::Payments, &id).await
}
