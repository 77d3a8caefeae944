//! `OpenAPI` (3.1) document for the billing proxy.

use utoipa::{
    openapi::{
        security::{ApiKey, ApiKeyValue, SecurityScheme},
        Server,
    },
    Modify, OpenApi,
};

use crate::routes::{customers, invoices, payments};

/// `OpenAPI` documentation for `/api/v1/*`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stripe API Proxy",
        version = "1.0.0",
        description = "Proxy service for Stripe API integration"
    ),
    paths(
        customers::create_customer,
        customers::list_customers,
        customers::get_customer,
        invoices::create_invoice,
        invoices::list_invoices,
        invoices::get_invoice,
        payments::create_payment,
        payments::list_payments,
        payments::get_payment,
    ),
    components(
        schemas(
            crate::error::BillingErrorBody,
            crate::error::ServerErrorBody,
            crate::routes::StripeList,
            customers::CustomerParams,
            customers::Customer,
            invoices::InvoiceParams,
            invoices::Invoice,
            payments::PaymentParams,
            payments::Payment,
        )
    ),
    tags(
        (name = "Customers", description = "Customer management operations"),
        (name = "Invoices", description = "Invoice management operations"),
        (name = "Payments", description = "Payments management operations"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "apiKey",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-api-key"))),
        );
    }
}

/// The document with `host_url` as its only server.
#[must_use]
pub fn openapi(host_url: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.servers = Some(vec![Server::new(host_url)]);
    doc
}
