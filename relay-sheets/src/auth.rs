//! Service-account JWT assertions and the per-request client factory.
//!
//! Each request signs a fresh RS256 assertion, trades it for an access token
//! at the credential's token URI, and wraps the token in a
//! [`GoogleSheetsClient`]. Tokens are not cached between requests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    api::{SheetsApi, SheetsConnector},
    credential::ServiceAccount,
    error::{SheetsError, VendorError},
    google::{execute, http_client, GoogleEndpoints, GoogleSheetsClient},
};

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// Read/write on sheets, read-only on Drive (needed for the listing).
pub const SCOPES: &[&str] = &[SPREADSHEETS_SCOPE, DRIVE_READONLY_SCOPE];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Claims of the self-signed assertion sent to the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AssertionClaims {
    #[must_use]
    pub fn new(account: &ServiceAccount, scopes: &[&str], issued_at: i64) -> Self {
        Self {
            iss: account.client_email().to_owned(),
            scope: scopes.join(" "),
            aud: account.token_uri().to_owned(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        }
    }
}

/// Sign an RS256 assertion for `account`, valid for one hour from `issued_at`.
///
/// # Errors
/// Returns [`SheetsError::Signing`] if the key cannot sign.
pub fn sign_assertion(
    account: &ServiceAccount,
    scopes: &[&str],
    issued_at: i64,
) -> Result<String, SheetsError> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = account.private_key_id().map(str::to_owned);
    let claims = AssertionClaims::new(account, scopes, issued_at);
    Ok(jsonwebtoken::encode(&header, &claims, account.signing_key())?)
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Exchange a signed assertion for a bearer access token.
///
/// # Errors
/// Returns [`SheetsError::Vendor`] if the token endpoint refuses the assertion,
/// or [`SheetsError::Transport`] if it cannot be reached.
pub async fn exchange_assertion(
    http: &Client,
    token_uri: &str,
    assertion: &str,
) -> Result<String, SheetsError> {
    let builder = http
        .post(token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)]);
    let value = execute(builder).await?;
    let token: TokenResponse = serde_json::from_value(value).map_err(|e| {
        SheetsError::Vendor(VendorError {
            message: format!("token endpoint returned no access token: {e}"),
            code: None,
            status: None,
            errors: None,
        })
    })?;
    debug!(expires_in = ?token.expires_in, "obtained access token");
    Ok(token.access_token)
}

/// Client factory backed by the credential loaded at startup.
#[derive(Debug, Clone)]
pub struct ServiceAccountConnector {
    account: Option<Arc<ServiceAccount>>,
    http: Client,
    endpoints: GoogleEndpoints,
}

impl ServiceAccountConnector {
    /// Connector for the public Google endpoints.
    ///
    /// # Errors
    /// Returns [`SheetsError::Transport`] if the HTTP client cannot be built.
    pub fn new(account: Option<ServiceAccount>) -> Result<Self, SheetsError> {
        Ok(Self::with_client(account, http_client()?, GoogleEndpoints::default()))
    }

    #[must_use]
    pub fn with_client(account: Option<ServiceAccount>, http: Client, endpoints: GoogleEndpoints) -> Self {
        Self {
            account: account.map(Arc::new),
            http,
            endpoints,
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.account.is_some()
    }
}

#[async_trait]
impl SheetsConnector for ServiceAccountConnector {
    async fn connect(&self) -> Result<Box<dyn SheetsApi>, SheetsError> {
        let account = self.account.as_deref().ok_or(SheetsError::NotConfigured)?;
        let assertion = sign_assertion(account, SCOPES, Utc::now().timestamp())?;
        let access_token = exchange_assertion(&self.http, account.token_uri(), &assertion).await?;
        Ok(Box::new(GoogleSheetsClient::new(
            self.http.clone(),
            self.endpoints.clone(),
            access_token,
        )))
    }

    fn principal(&self) -> Option<&str> {
        self.account.as_deref().map(ServiceAccount::client_email)
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

    use super::*;

    const FIXTURE: &str = include_str!("../tests/fixtures/service-account.json");
    const PUBLIC_KEY: &str = include_str!("../tests/fixtures/service-account.pub.pem");

    fn account() -> ServiceAccount {
        match ServiceAccount::from_json(FIXTURE) {
            Ok(a) => a,
            Err(e) => panic!("fixture should parse: {e}"),
        }
    }

    #[test]
    fn assertion_claims_cover_email_scopes_audience_and_lifetime() {
        let claims = AssertionClaims::new(&account(), SCOPES, 1_700_000_000);
        assert_eq!(claims.iss, "relay-test@relay-test.iam.gserviceaccount.com");
        assert_eq!(
            claims.scope,
            "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.readonly"
        );
        assert_eq!(claims.aud, "https://oauth2.googleapis.com/token");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn signed_assertion_verifies_with_public_key() {
        let now = Utc::now().timestamp();
        let token = match sign_assertion(&account(), SCOPES, now) {
            Ok(t) => t,
            Err(e) => panic!("signing failed: {e}"),
        };

        let header = match decode_header(&token) {
            Ok(h) => h,
            Err(e) => panic!("bad header: {e}"),
        };
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("test-key-1"));

        let key = match DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()) {
            Ok(k) => k,
            Err(e) => panic!("bad public key: {e}"),
        };
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&["https://oauth2.googleapis.com/token"]);
        let data = match decode::<AssertionClaims>(&token, &key, &validation) {
            Ok(d) => d,
            Err(e) => panic!("assertion did not verify: {e}"),
        };
        assert_eq!(data.claims.iat, now);
    }

    #[tokio::test]
    async fn connector_without_credential_reports_not_configured() {
        let connector = ServiceAccountConnector::with_client(None, Client::new(), GoogleEndpoints::default());
        assert!(!connector.is_configured());
        assert!(connector.principal().is_none());
        assert!(matches!(connector.connect().await, Err(SheetsError::NotConfigured)));
    }

    #[test]
    fn connector_principal_is_client_email() {
        let connector =
            ServiceAccountConnector::with_client(Some(account()), Client::new(), GoogleEndpoints::default());
        assert_eq!(connector.principal(), Some("relay-test@relay-test.iam.gserviceaccount.com"));
    }
}
