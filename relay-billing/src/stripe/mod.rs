//! Stripe REST client and the trait handlers call it through.

pub mod form;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{BillingError, StripeError};

/// Billing resources the proxy exposes, mapped to Stripe collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BillingResource {
    Customers,
    Invoices,
    /// Exposed as `payments`, backed by Stripe payment intents.
    Payments,
}

impl BillingResource {
    /// Collection name in Stripe's `/v1/...` paths.
    #[must_use]
    pub fn stripe_path(self) -> &'static str {
        match self {
            BillingResource::Customers => "customers",
            BillingResource::Invoices => "invoices",
            BillingResource::Payments => "payment_intents",
        }
    }
}

impl std::fmt::Display for BillingResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BillingResource::Customers => "customers",
            BillingResource::Invoices => "invoices",
            BillingResource::Payments => "payments",
        })
    }
}

/// One Stripe call per method.
///
/// # Cancel Safety
/// Dropping a returned future abandons the HTTP request. Stripe may still
/// have applied a create.
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// Create an object from JSON `params`.
    ///
    /// # Errors
    /// [`BillingError::InvalidRequest`] if `params` is not an object, otherwise
    /// the Stripe or transport failure.
    async fn create(&self, resource: BillingResource, params: &Value) -> Result<Value, BillingError>;

    /// List objects; `query` is forwarded untouched.
    ///
    /// # Errors
    /// Returns the Stripe or transport failure.
    async fn list(&self, resource: BillingResource, query: Option<&str>) -> Result<Value, BillingError>;

    /// Retrieve one object by id.
    ///
    /// # Errors
    /// Returns the Stripe or transport failure.
    async fn retrieve(&self, resource: BillingResource, id: &str) -> Result<Value, BillingError>;
}

#[derive(Deserialize)]
struct StripeErrorEnvelope {
    error: StripeError,
}

/// [`BillingApi`] over Stripe's REST API with a secret key.
#[derive(Clone)]
pub struct StripeClient {
    http: Client,
    base: Url,
    secret: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// # Errors
    /// Returns [`BillingError::Endpoint`] if `base` is not an absolute URL, or
    /// [`BillingError::Transport`] if the HTTP client cannot be built.
    pub fn new(base: &str, secret: impl Into<String>) -> Result<Self, BillingError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Self::with_client(http, base, secret)
    }

    /// # Errors
    /// Returns [`BillingError::Endpoint`] if `base` is not an absolute URL.
    pub fn with_client(http: Client, base: &str, secret: impl Into<String>) -> Result<Self, BillingError> {
        let base: Url = base.parse().map_err(|_| BillingError::Endpoint(base.to_owned()))?;
        if base.cannot_be_a_base() {
            return Err(BillingError::Endpoint(base.to_string()));
        }
        Ok(Self {
            http,
            base,
            secret: secret.into(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, BillingError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| BillingError::Endpoint(self.base.to_string()))?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, BillingError> {
        let response = builder.bearer_auth(&self.secret).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = %status, bytes = body.len(), "stripe response");

        if status.is_success() {
            return serde_json::from_slice(&body).map_err(|e| BillingError::Stripe {
                status: status.as_u16(),
                error: StripeError {
                    message: format!("invalid JSON from Stripe: {e}"),
                    ..StripeError::default()
                },
            });
        }
        let error = serde_json::from_slice::<StripeErrorEnvelope>(&body).map_or_else(
            |_| StripeError {
                message: format!("Request failed with status code {}", status.as_u16()),
                ..StripeError::default()
            },
            |envelope| envelope.error,
        );
        Err(BillingError::Stripe {
            status: status.as_u16(),
            error,
        })
    }
}

#[async_trait]
impl BillingApi for StripeClient {
    async fn create(&self, resource: BillingResource, params: &Value) -> Result<Value, BillingError> {
        let pairs = form::flatten(params)?;
        let url = self.url(&[resource.stripe_path()])?;
        self.send(self.http.post(url).form(&pairs)).await
    }

    async fn list(&self, resource: BillingResource, query: Option<&str>) -> Result<Value, BillingError> {
        let mut url = self.url(&[resource.stripe_path()])?;
        url.set_query(query.filter(|q| !q.is_empty()));
        self.send(self.http.get(url)).await
    }

    async fn retrieve(&self, resource: BillingResource, id: &str) -> Result<Value, BillingError> {
        let url = self.url(&[resource.stripe_path(), id])?;
        self.send(self.http.get(url)).await
    }
}
