//! Entry point for the `relay-sheets` HTTP server.

use std::sync::Arc;

use relay_core::{config::load_dotenv, env_lookup, init_logging, server::serve, LogFormat};
use relay_sheets::{
    auth::ServiceAccountConnector, config::SheetsConfig, credential, routes::create_router,
    SheetsConnector, SCOPES,
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let dotenv = load_dotenv();
    init_logging(LogFormat::from_value(env_lookup("LOG_FORMAT").as_deref()));
    if dotenv {
        info!("loaded .env");
    }

    let config = match SheetsConfig::from_lookup(&env_lookup) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let account = credential::load(config.service_account.as_deref());
    let connector = match ServiceAccountConnector::new(account) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to build HTTP client");
            std::process::exit(1);
        }
    };

    info!(
        service_account = connector.principal().unwrap_or("Not configured"),
        scopes = %SCOPES.join(", "),
        "Google Sheets API proxy starting"
    );

    let app = create_router(Arc::new(connector));
    if let Err(e) = serve(app, config.listen, "relay-sheets").await {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}
