//! Entry point for the `relay-billing` HTTP server.

use std::sync::Arc;

use relay_core::{
    config::load_dotenv, env_lookup, init_logging, server::serve, ApiKeyGate, FilterChain,
    FixedWindowLimiter, LogFormat,
};
use relay_billing::{
    build_router, config::BillingConfig, openapi::openapi, AppState, BillingApi, StripeClient,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let dotenv = load_dotenv();
    init_logging(LogFormat::from_value(env_lookup("LOG_FORMAT").as_deref()));
    if dotenv {
        info!("loaded .env");
    }

    let config = match BillingConfig::from_lookup(&env_lookup) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let billing: Option<Arc<dyn BillingApi>> = match config.stripe_secret.as_deref() {
        Some(secret) => match StripeClient::new(&config.stripe_base, secret) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                error!(error = %e, "failed to build Stripe client");
                std::process::exit(1);
            }
        },
        None => {
            warn!("STRIPE_SECRET_KEY is not set; billing routes will return 500");
            None
        }
    };

    let filters = FilterChain::new()
        .with(FixedWindowLimiter::new(config.rate_limit))
        .with(ApiKeyGate::new(config.api_key.clone()));

    info!(
        host_url = %config.host_url,
        mode = ?config.run_mode,
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_secs = config.rate_limit.window.as_secs(),
        "Stripe API proxy starting"
    );

    let app = build_router(
        AppState::new(billing),
        openapi(&config.host_url),
        filters,
        config.run_mode,
    );
    if let Err(e) = serve(app, config.listen, "relay-billing").await {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}
