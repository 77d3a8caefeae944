//! reqwest-backed Sheets v4 / Drive v3 client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::{
    api::{SheetsApi, SpreadsheetSummary, ValueInputOption},
    error::{SheetsError, VendorError},
};

pub const DEFAULT_SHEETS_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_DRIVE_BASE: &str = "https://www.googleapis.com";

/// Drive query selecting only Google Sheets files.
pub const SPREADSHEET_QUERY: &str = "mimeType='application/vnd.google-apps.spreadsheet'";
const LISTING_FIELDS: &str = "files(id, name)";

/// Base URLs of the Google APIs the proxy talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleEndpoints {
    pub sheets: String,
    pub drive: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            sheets: DEFAULT_SHEETS_BASE.to_owned(),
            drive: DEFAULT_DRIVE_BASE.to_owned(),
        }
    }
}

impl GoogleEndpoints {
    /// Point both APIs at one base URL.
    #[must_use]
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            sheets: base.clone(),
            drive: base,
        }
    }
}

/// Build the shared HTTP client used for token exchange and API calls.
///
/// # Errors
/// Returns [`SheetsError::Transport`] if the TLS backend cannot initialise.
pub fn http_client() -> Result<Client, SheetsError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()?)
}

/// Join `segments` onto `base`, percent-encoding each one.
pub(crate) fn endpoint_url(base: &str, segments: &[&str]) -> Result<Url, SheetsError> {
    let mut url: Url = base
        .parse()
        .map_err(|_| SheetsError::Endpoint(base.to_owned()))?;
    url.path_segments_mut()
        .map_err(|()| SheetsError::Endpoint(base.to_owned()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-2xx Google response body into a [`VendorError`].
///
/// Understands both the API error shape (`{"error": {"code", "message", ...}}`)
/// and the OAuth token endpoint shape (`{"error": "...", "error_description": "..."}`).
#[must_use]
pub fn parse_vendor_error(status: StatusCode, body: &[u8]) -> VendorError {
    let code = Some(i64::from(status.as_u16()));
    let fallback = || VendorError {
        message: format!("Request failed with status code {}", status.as_u16()),
        code,
        status: status.canonical_reason().map(str::to_owned),
        errors: None,
    };

    let Ok(parsed) = serde_json::from_slice::<Value>(body) else {
        return fallback();
    };

    match parsed.get("error") {
        Some(Value::Object(obj)) => VendorError {
            message: obj
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| fallback().message, str::to_owned),
            code: obj.get("code").and_then(Value::as_i64).or(code),
            status: obj.get("status").and_then(Value::as_str).map(str::to_owned),
            errors: obj.get("errors").cloned(),
        },
        Some(Value::String(kind)) => {
            let message = match parsed.get("error_description").and_then(Value::as_str) {
                Some(desc) => format!("{kind}: {desc}"),
                None => kind.clone(),
            };
            VendorError {
                message,
                code,
                status: Some(kind.clone()),
                errors: None,
            }
        }
        _ => fallback(),
    }
}

/// Send `builder` and decode a JSON body, mapping non-2xx to [`SheetsError::Vendor`].
pub(crate) async fn execute(builder: RequestBuilder) -> Result<Value, SheetsError> {
    let response = builder.send().await?;
    let status = response.status();
    let body = response.bytes().await?;
    debug!(status = %status, bytes = body.len(), "google response");

    if !status.is_success() {
        return Err(SheetsError::Vendor(parse_vendor_error(status, &body)));
    }
    if body.is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_slice(&body).map_err(|e| {
        SheetsError::Vendor(VendorError {
            message: format!("invalid JSON from Google: {e}"),
            code: Some(i64::from(status.as_u16())),
            status: None,
            errors: None,
        })
    })
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<SpreadsheetSummary>,
}

/// Sheets/Drive client carrying a bearer access token.
#[derive(Debug, Clone)]
pub struct GoogleSheetsClient {
    http: Client,
    endpoints: GoogleEndpoints,
    access_token: String,
}

impl GoogleSheetsClient {
    #[must_use]
    pub fn new(http: Client, endpoints: GoogleEndpoints, access_token: String) -> Self {
        Self {
            http,
            endpoints,
            access_token,
        }
    }

    fn sheets_url(&self, segments: &[&str]) -> Result<Url, SheetsError> {
        endpoint_url(&self.endpoints.sheets, segments)
    }
}

#[async_trait]
impl SheetsApi for GoogleSheetsClient {
    async fn list_spreadsheets(&self) -> Result<Vec<SpreadsheetSummary>, SheetsError> {
        let url = endpoint_url(&self.endpoints.drive, &["drive", "v3", "files"])?;
        let builder = self
            .http
            .get(url)
            .query(&[("q", SPREADSHEET_QUERY), ("fields", LISTING_FIELDS)])
            .bearer_auth(&self.access_token);
        let value = execute(builder).await?;
        let list: FileList = serde_json::from_value(value).map_err(|e| {
            SheetsError::Vendor(VendorError {
                message: format!("unexpected Drive listing shape: {e}"),
                code: None,
                status: None,
                errors: None,
            })
        })?;
        Ok(list.files)
    }

    async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Value, SheetsError> {
        let url = self.sheets_url(&["v4", "spreadsheets", spreadsheet_id])?;
        execute(self.http.get(url).bearer_auth(&self.access_token)).await
    }

    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Value, SheetsError> {
        let url = self.sheets_url(&["v4", "spreadsheets", spreadsheet_id, "values", range])?;
        execute(self.http.get(url).bearer_auth(&self.access_token)).await
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        option: ValueInputOption,
        values: Vec<Vec<Value>>,
    ) -> Result<Value, SheetsError> {
        let url = self.sheets_url(&["v4", "spreadsheets", spreadsheet_id, "values", range])?;
        let builder = self
            .http
            .put(url)
            .query(&[("valueInputOption", option.as_str())])
            .bearer_auth(&self.access_token)
            .json(&json!({ "values": values }));
        execute(builder).await
    }
}
