//! Billing router and its middleware stack.
//!
//! Outermost first: request id and request logging, hardened headers, CORS,
//! panic catcher, request filters (rate limit then API key), routes. Body
//! parsing happens in the handlers' extractors, after the filters. Swagger UI
//! and the `OpenAPI` document sit behind the same filters as the API.

use std::any::Any;

use axum::{middleware, Router};
use relay_core::{
    error::not_found, filter::apply_filters, headers::harden, server::observe, FilterChain, RunMode,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::panic_response,
    routes::{customers, invoices, payments, AppState},
};

/// Swagger UI mount point. `/api/docs` redirects to `/api/docs/`.
pub const DOCS_PATH: &str = "/api/docs";

/// Where the `OpenAPI` document is served.
pub const OPENAPI_PATH: &str = "/api/openapi.json";

/// Build the application router.
///
/// `filters` runs on every request, unmatched paths included.
pub fn build_router(
    state: AppState,
    doc: utoipa::openapi::OpenApi,
    filters: FilterChain,
    mode: RunMode,
) -> Router {
    let app = Router::new()
        .merge(customers::routes())
        .merge(invoices::routes())
        .merge(payments::routes())
        .merge(SwaggerUi::new(DOCS_PATH).url(OPENAPI_PATH, doc))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn_with_state(filters, apply_filters))
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send>| {
            panic_response(mode, panic.as_ref())
        }))
        .layer(CorsLayer::permissive());
    observe(harden(app))
}
