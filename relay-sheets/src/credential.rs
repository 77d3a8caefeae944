//! Service-account credential loading.
//!
//! The credential arrives as one JSON blob in `GOOGLE_SERVICE_ACCOUNT`. Loading
//! never fails startup: a missing, placeholder or malformed value leaves the
//! proxy running with no credential, and every route then reports the
//! configuration error.

use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use tracing::{error, info};

/// Environment variable holding the service-account JSON.
pub const CREDENTIAL_VAR: &str = "GOOGLE_SERVICE_ACCOUNT";

/// OAuth token endpoint used when the blob does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Value some deploy tooling writes for an unset variable.
const UNSET_SENTINEL: &str = "undefined";

/// Reasons a credential blob is rejected.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CredentialError {
    #[error("GOOGLE_SERVICE_ACCOUNT environment variable is not set or is undefined")]
    Missing,

    #[error("credential is not valid service-account JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("credential field '{0}' is empty")]
    EmptyField(&'static str),

    #[error("private_key is not a valid RSA PEM key: {0}")]
    PrivateKey(#[source] jsonwebtoken::errors::Error),
}

#[derive(Deserialize)]
struct RawServiceAccount {
    client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
}

/// A parsed, ready-to-sign service-account identity.
#[derive(Clone)]
pub struct ServiceAccount {
    client_email: String,
    private_key_id: Option<String>,
    token_uri: String,
    project_id: Option<String>,
    signing_key: EncodingKey,
}

impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccount {
    /// Parse the JSON key file format Google issues for service accounts.
    ///
    /// # Errors
    /// Returns [`CredentialError`] if the JSON is malformed, a required field is
    /// empty, or the private key is not an RSA PEM key.
    pub fn from_json(raw: &str) -> Result<Self, CredentialError> {
        let parsed: RawServiceAccount = serde_json::from_str(raw)?;
        if parsed.client_email.trim().is_empty() {
            return Err(CredentialError::EmptyField("client_email"));
        }
        if parsed.private_key.trim().is_empty() {
            return Err(CredentialError::EmptyField("private_key"));
        }
        let signing_key = EncodingKey::from_rsa_pem(parsed.private_key.as_bytes())
            .map_err(CredentialError::PrivateKey)?;

        Ok(Self {
            client_email: parsed.client_email,
            private_key_id: parsed.private_key_id.filter(|id| !id.is_empty()),
            token_uri: parsed
                .token_uri
                .filter(|uri| !uri.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_owned()),
            project_id: parsed.project_id,
            signing_key,
        })
    }

    #[must_use]
    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    #[must_use]
    pub fn private_key_id(&self) -> Option<&str> {
        self.private_key_id.as_deref()
    }

    #[must_use]
    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Point token exchange at a different endpoint.
    #[must_use]
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    pub(crate) fn signing_key(&self) -> &EncodingKey {
        &self.signing_key
    }
}

/// Parse the raw variable value, treating blank and `"undefined"` as unset.
///
/// # Errors
/// Returns [`CredentialError::Missing`] for an unset value, otherwise whatever
/// [`ServiceAccount::from_json`] reports.
pub fn parse(value: Option<&str>) -> Result<ServiceAccount, CredentialError> {
    match value.map(str::trim) {
        None | Some("" | UNSET_SENTINEL) => Err(CredentialError::Missing),
        Some(raw) => ServiceAccount::from_json(raw),
    }
}

/// Load the credential, logging the outcome. Absence is reported as `None`.
#[must_use]
pub fn load(value: Option<&str>) -> Option<ServiceAccount> {
    match parse(value) {
        Ok(account) => {
            info!(client_email = account.client_email(), "parsed {CREDENTIAL_VAR}");
            Some(account)
        }
        Err(CredentialError::Missing) => {
            error!("{CREDENTIAL_VAR} environment variable is not set or is undefined");
            None
        }
        Err(e) => {
            error!(error = %e, "error parsing {CREDENTIAL_VAR}");
            None
        }
    }
}
