//! Vendor abstraction for the sheets proxy.
//!
//! Route handlers only see these two traits, so tests can swap the Google
//! client for an in-memory fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SheetsError;

/// One entry of the spreadsheet listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetSummary {
    pub id: String,
    pub name: String,
}

/// How Google interprets written cell values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueInputOption {
    /// Values are stored as-is.
    #[default]
    Raw,
    /// Values are parsed as if typed into the UI.
    UserEntered,
}

impl ValueInputOption {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

impl std::fmt::Display for ValueInputOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated Sheets/Drive client. Each method is one vendor call.
///
/// # Cancel Safety
/// Dropping any returned future abandons the in-flight HTTP request; no local
/// state is left behind.
#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// Every spreadsheet visible to the credential.
    ///
    /// # Errors
    /// Returns [`SheetsError::Vendor`] or [`SheetsError::Transport`] on failure.
    async fn list_spreadsheets(&self) -> Result<Vec<SpreadsheetSummary>, SheetsError>;

    /// Spreadsheet metadata, verbatim.
    ///
    /// # Errors
    /// Returns [`SheetsError::Vendor`] or [`SheetsError::Transport`] on failure.
    async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Value, SheetsError>;

    /// The value range for `range` (A1 notation), verbatim.
    ///
    /// # Errors
    /// Returns [`SheetsError::Vendor`] or [`SheetsError::Transport`] on failure.
    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Value, SheetsError>;

    /// Overwrite `range` with `values` and return Google's update result.
    ///
    /// # Errors
    /// Returns [`SheetsError::Vendor`] or [`SheetsError::Transport`] on failure.
    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        option: ValueInputOption,
        values: Vec<Vec<Value>>,
    ) -> Result<Value, SheetsError>;
}

/// Builds an authenticated [`SheetsApi`] for a single request.
#[async_trait]
pub trait SheetsConnector: Send + Sync {
    /// Produce a client scoped to the proxy's fixed scopes.
    ///
    /// # Errors
    /// Returns [`SheetsError::NotConfigured`] when no credential was loaded, or
    /// the signing/token-exchange failure otherwise.
    async fn connect(&self) -> Result<Box<dyn SheetsApi>, SheetsError>;

    /// Email of the identity requests run as, if configured.
    fn principal(&self) -> Option<&str>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_input_option_defaults_to_raw() {
        assert_eq!(ValueInputOption::default(), ValueInputOption::Raw);
    }

    #[test]
    fn value_input_option_uses_wire_names() {
        let parsed: ValueInputOption = match serde_json::from_str("\"USER_ENTERED\"") {
            Ok(v) => v,
            Err(e) => panic!("parse failed: {e}"),
        };
        assert_eq!(parsed, ValueInputOption::UserEntered);
        assert_eq!(ValueInputOption::Raw.to_string(), "RAW");
        assert!(serde_json::from_str::<ValueInputOption>("\"raw\"").is_err());
    }
}
