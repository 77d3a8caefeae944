//! Axum route handlers for the sheets proxy.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use relay_core::{error::not_found, server::observe};
use serde::Deserialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::{
    api::{SheetsConnector, SpreadsheetSummary, ValueInputOption},
    error::{DetailedError, SheetsError},
};

// ── Shared state ─────────────────────────────────────────────────────────────

type Connector = Arc<dyn SheetsConnector>;

/// Remediation hint attached to listing failures.
pub const LISTING_TIP: &str = "Make sure the Drive API is enabled in the Google Cloud Console \
     and the service account has the required permissions";

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct UpdateParams {
    #[serde(default, rename = "valueInputOption")]
    pub value_input_option: ValueInputOption,
}

#[derive(Debug, Deserialize)]
pub struct UpdateValuesBody {
    pub values: Vec<Vec<Value>>,
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router around a client factory.
pub fn create_router(connector: Connector) -> Router {
    let router = Router::new()
        .route("/", get(status))
        .route("/spreadsheets", get(list_spreadsheets))
        .route("/spreadsheets/{spreadsheet_id}", get(get_spreadsheet))
        .route(
            "/spreadsheets/{spreadsheet_id}/values/{range}",
            get(get_values).put(update_values),
        )
        .fallback(not_found)
        .with_state(connector)
        .layer(CorsLayer::permissive());
    observe(router)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /`: liveness marker.
pub async fn status() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({"status": "Google Sheets API Proxy is running"})),
    )
}

/// `GET /spreadsheets`: every spreadsheet the credential can see.
///
/// # Errors
/// Returns a [`DetailedError`] carrying vendor diagnostics and [`LISTING_TIP`].
pub async fn list_spreadsheets(
    State(connector): State<Connector>,
) -> Result<Json<Vec<SpreadsheetSummary>>, DetailedError> {
    let fetch = async {
        let client = connector.connect().await?;
        info!("requesting spreadsheet list from Google Drive");
        client.list_spreadsheets().await
    };
    match fetch.await {
        Ok(files) => {
            info!(count = files.len(), "found spreadsheets");
            Ok(Json(files))
        }
        Err(e) => {
            error!(error = %e, "error listing spreadsheets");
            Err(e.with_tip(LISTING_TIP))
        }
    }
}

/// `GET /spreadsheets/{spreadsheet_id}`: spreadsheet metadata.
///
/// # Errors
/// Returns [`SheetsError`] if no credential is configured or Google fails.
pub async fn get_spreadsheet(
    State(connector): State<Connector>,
    Path(spreadsheet_id): Path<String>,
) -> Result<Json<Value>, SheetsError> {
    let client = connector.connect().await.inspect_err(log_failure("getting spreadsheet"))?;
    let data = client
        .get_spreadsheet(&spreadsheet_id)
        .await
        .inspect_err(log_failure("getting spreadsheet"))?;
    Ok(Json(data))
}

/// `GET /spreadsheets/{spreadsheet_id}/values/{range}`: read a range.
///
/// # Errors
/// Returns [`SheetsError`] if no credential is configured or Google fails.
pub async fn get_values(
    State(connector): State<Connector>,
    Path((spreadsheet_id, range)): Path<(String, String)>,
) -> Result<Json<Value>, SheetsError> {
    let client = connector.connect().await.inspect_err(log_failure("getting values"))?;
    let data = client
        .get_values(&spreadsheet_id, &range)
        .await
        .inspect_err(log_failure("getting values"))?;
    Ok(Json(data))
}

/// `PUT /spreadsheets/{spreadsheet_id}/values/{range}`: overwrite a range.
///
/// `valueInputOption` defaults to `RAW`.
///
/// # Errors
/// Returns [`SheetsError::InvalidRequest`] for a malformed body or option,
/// otherwise the connector or vendor failure.
pub async fn update_values(
    State(connector): State<Connector>,
    Path((spreadsheet_id, range)): Path<(String, String)>,
    params: Result<Query<UpdateParams>, QueryRejection>,
    body: Result<Json<UpdateValuesBody>, JsonRejection>,
) -> Result<Json<Value>, SheetsError> {
    let Query(params) = params.map_err(|e| SheetsError::InvalidRequest(e.body_text()))?;
    let Json(body) = body.map_err(|e| SheetsError::InvalidRequest(e.body_text()))?;

    let client = connector.connect().await.inspect_err(log_failure("updating values"))?;
    let data = client
        .update_values(&spreadsheet_id, &range, params.value_input_option, body.values)
        .await
        .inspect_err(log_failure("updating values"))?;
    Ok(Json(data))
}

fn log_failure(action: &'static str) -> impl Fn(&SheetsError) {
    move |e| error!(error = %e, "error {action}")
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::{api::SheetsApi, error::VendorError};

    type UpdateCall = (String, String, ValueInputOption, Vec<Vec<Value>>);

    /// Records every vendor call the handlers make.
    #[derive(Default)]
    struct Recorder {
        connects: AtomicUsize,
        vendor_calls: AtomicUsize,
        last_update: Mutex<Option<UpdateCall>>,
    }

    struct FakeConnector {
        recorder: Arc<Recorder>,
        configured: bool,
        failure: Option<VendorError>,
    }

    struct FakeSheets {
        recorder: Arc<Recorder>,
        failure: Option<VendorError>,
    }

    impl FakeSheets {
        fn call(&self) -> Result<(), SheetsError> {
            self.recorder.vendor_calls.fetch_add(1, Ordering::SeqCst);
            match &self.failure {
                Some(f) => Err(SheetsError::Vendor(f.clone())),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl SheetsApi for FakeSheets {
        async fn list_spreadsheets(&self) -> Result<Vec<SpreadsheetSummary>, SheetsError> {
            self.call()?;
            Ok(vec![SpreadsheetSummary {
                id: "1AbC".to_owned(),
                name: "Budget".to_owned(),
            }])
        }

        async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Value, SheetsError> {
            self.call()?;
            Ok(json!({"spreadsheetId": spreadsheet_id, "properties": {"title": "Budget"}}))
        }

        async fn get_values(&self, _spreadsheet_id: &str, range: &str) -> Result<Value, SheetsError> {
            self.call()?;
            Ok(json!({"range": range, "majorDimension": "ROWS", "values": [["1", "2"]]}))
        }

        async fn update_values(
            &self,
            spreadsheet_id: &str,
            range: &str,
            option: ValueInputOption,
            values: Vec<Vec<Value>>,
        ) -> Result<Value, SheetsError> {
            self.call()?;
            let cells = values.iter().map(Vec::len).sum::<usize>();
            if let Ok(mut slot) = self.recorder.last_update.lock() {
                *slot = Some((spreadsheet_id.to_owned(), range.to_owned(), option, values));
            }
            Ok(json!({
                "spreadsheetId": spreadsheet_id,
                "updatedRange": range,
                "updatedCells": cells,
            }))
        }
    }

    #[async_trait]
    impl SheetsConnector for FakeConnector {
        async fn connect(&self) -> Result<Box<dyn SheetsApi>, SheetsError> {
            self.recorder.connects.fetch_add(1, Ordering::SeqCst);
            if !self.configured {
                return Err(SheetsError::NotConfigured);
            }
            Ok(Box::new(FakeSheets {
                recorder: Arc::clone(&self.recorder),
                failure: self.failure.clone(),
            }))
        }

        fn principal(&self) -> Option<&str> {
            self.configured.then_some("fake@example.iam.gserviceaccount.com")
        }
    }

    fn app(configured: bool, failure: Option<VendorError>) -> (Router, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let connector = FakeConnector {
            recorder: Arc::clone(&recorder),
            configured,
            failure,
        };
        (create_router(Arc::new(connector)), recorder)
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let req = match builder.body(body) {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        let resp = match app.oneshot(req).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        let status = resp.status();
        let bytes = match axum::body::to_bytes(resp.into_body(), 64 * 1024).await {
            Ok(b) => b,
            Err(e) => panic!("failed to read body: {e}"),
        };
        let value = match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(e) => panic!("invalid JSON: {e}"),
        };
        (status, value)
    }

    #[tokio::test]
    async fn status_route_reports_running() {
        let (app, _) = app(false, None);
        let (status, body) = send(app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Google Sheets API Proxy is running");
    }

    #[tokio::test]
    async fn list_returns_id_name_pairs() {
        let (app, recorder) = app(true, None);
        let (status, body) = send(app, "GET", "/spreadsheets", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"id": "1AbC", "name": "Budget"}]));
        assert_eq!(recorder.vendor_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn every_route_reports_missing_credential_as_500() {
        for (method, uri, body) in [
            ("GET", "/spreadsheets", None),
            ("GET", "/spreadsheets/ABC", None),
            ("GET", "/spreadsheets/ABC/values/A1:B2", None),
            ("PUT", "/spreadsheets/ABC/values/A1:B2", Some(json!({"values": [["1"]]}))),
        ] {
            let (app, recorder) = app(false, None);
            let (status, body) = send(app, method, uri, body).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
            assert_eq!(
                body["error"],
                "GOOGLE_SERVICE_ACCOUNT environment variable is not set or is invalid",
                "{method} {uri}"
            );
            assert_eq!(recorder.vendor_calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn list_failure_includes_details_and_tip() {
        let failure = VendorError {
            message: "Google Drive API has not been used in project 1".to_owned(),
            code: Some(403),
            status: Some("PERMISSION_DENIED".to_owned()),
            errors: None,
        };
        let (app, _) = app(true, Some(failure));
        let (status, body) = send(app, "GET", "/spreadsheets", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Google Drive API has not been used in project 1");
        assert_eq!(body["details"]["code"], 403);
        assert_eq!(body["details"]["details"], "No detailed errors");
        assert_eq!(body["tip"], LISTING_TIP);
    }

    #[tokio::test]
    async fn get_spreadsheet_passes_vendor_body_through() {
        let (app, recorder) = app(true, None);
        let (status, body) = send(app, "GET", "/spreadsheets/ABC", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["spreadsheetId"], "ABC");
        assert_eq!(recorder.connects.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.vendor_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn get_values_decodes_encoded_range() {
        let (app, _) = app(true, None);
        let (status, body) = send(app, "GET", "/spreadsheets/ABC/values/Sheet1%21A1%3AB2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["range"], "Sheet1!A1:B2");
    }

    #[tokio::test]
    async fn vendor_failure_maps_to_500_error_envelope() {
        let failure = VendorError {
            message: "Unable to parse range: Nope".to_owned(),
            code: Some(400),
            status: Some("INVALID_ARGUMENT".to_owned()),
            errors: None,
        };
        let (app, _) = app(true, Some(failure));
        let (status, body) = send(app, "GET", "/spreadsheets/ABC/values/Nope", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Unable to parse range: Nope"}));
    }

    #[tokio::test]
    async fn update_defaults_to_raw_and_echoes_vendor_result() {
        let (app, recorder) = app(true, None);
        let (status, body) = send(
            app,
            "PUT",
            "/spreadsheets/ABC/values/A1:B2",
            Some(json!({"values": [["1", "2"]]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updatedRange"], "A1:B2");
        assert_eq!(body["updatedCells"], 2);
        assert_eq!(recorder.vendor_calls.load(Ordering::SeqCst), 1);

        let call = recorder.last_update.lock().ok().and_then(|slot| slot.clone());
        match call {
            Some((id, range, option, values)) => {
                assert_eq!(id, "ABC");
                assert_eq!(range, "A1:B2");
                assert_eq!(option, ValueInputOption::Raw);
                assert_eq!(values, vec![vec![json!("1"), json!("2")]]);
            }
            None => panic!("update_values was not called"),
        }
    }

    #[tokio::test]
    async fn update_honours_user_entered_option() {
        let (app, recorder) = app(true, None);
        let (status, _) = send(
            app,
            "PUT",
            "/spreadsheets/ABC/values/A1?valueInputOption=USER_ENTERED",
            Some(json!({"values": [["=SUM(1,2)"]]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let call = recorder.last_update.lock().ok().and_then(|slot| slot.clone());
        assert_eq!(call.map(|c| c.2), Some(ValueInputOption::UserEntered));
    }

    #[tokio::test]
    async fn update_rejects_bad_body_and_option_before_any_vendor_call() {
        let (app1, recorder1) = app(true, None);
        let (status, body) = send(app1, "PUT", "/spreadsheets/ABC/values/A1", Some(json!({"rows": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some_and(|m| m.starts_with("invalid request")));
        assert_eq!(recorder1.connects.load(Ordering::SeqCst), 0);

        let (app2, recorder2) = app(true, None);
        let (status, _) = send(
            app2,
            "PUT",
            "/spreadsheets/ABC/values/A1?valueInputOption=SHOUTING",
            Some(json!({"values": [["x"]]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(recorder2.vendor_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repeated_get_returns_identical_json() {
        let (app, recorder) = app(true, None);
        let (_, first) = send(app.clone(), "GET", "/spreadsheets/ABC/values/A1:B2", None).await;
        let (_, second) = send(app, "GET", "/spreadsheets/ABC/values/A1:B2", None).await;
        assert_eq!(first, second);
        assert_eq!(recorder.vendor_calls.load(Ordering::SeqCst), 2, "one vendor call per request");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let (app, _) = app(true, None);
        let (status, body) = send(app, "GET", "/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Not found"}));
    }
}
