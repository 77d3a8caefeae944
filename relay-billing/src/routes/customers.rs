//! Customer endpoints.

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

/// Customer route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/customers", post(create_customer).get(list_customers))
        .route("/api/v1/customers/{id}", get(get_customer))
}

/// Fields commonly sent when creating a customer. Any other Stripe customer
/// parameter is forwarded too.
#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerParams {
    pub email: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

/// Subset of the Stripe customer object.
#[derive(Debug, Serialize, ToSchema)]
pub struct Customer {
    /// `cus_...`
    pub id: String,
    pub object: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Unix seconds.
    pub created: i64,
    pub metadata: HashMap<String, String>,
}

/// Create a customer.
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    tag = "Customers",
    request_body(
        content = CustomerParams,
        description = "JSON or application/x-www-form-urlencoded"
    ),
    responses(
        (status = 200, description = "The created customer", body = Customer),
        (status = 400, description = "Unreadable body", body = BillingErrorBody),
        (status = 401, description = "Missing or wrong API key", body = BillingErrorBody),
        (status = 429, description = "Rate limit exceeded", body = BillingErrorBody),
        (status = 500, description = "Stripe error", body = BillingErrorBody),
    ),
    security(("apiKey" = []))
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Payload(params): Payload,
) -> Result<Json<Value>, BillingError> {
    super::create(&state, BillingResource::Customers, &params).await
}

/// List customers.
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    tag = "Customers",
    params(ListParams),
    responses(
        (status = 200, description = "A page of customers", body = StripeList),
        (status = 401, description = "Missing or wrong API key", body = BillingErrorBody),
        (status = 500, description = "Stripe error", body = BillingErrorBody),
    ),
    security(("apiKey" = []))
)]
pub async fn list_customers(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, BillingError> {
    super::list(&state, BillingResource::Customers, query.as_deref()).await
}

/// Retrieve a customer.
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    tag = "Customers",
    params(("id" = String, Path, description = "Stripe customer id")),
    responses(
        (status = 200, description = "The customer", body = Customer),
        (status = 401, description = "Missing or wrong API key", body = BillingErrorBody),
        (status = 500, description = "Stripe error, including unknown ids", body = BillingErrorBody),
    ),
    security(("apiKey" = []))
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, BillingError> {
    super::retrieve(&state, BillingResource::Customers, &id).await
}
