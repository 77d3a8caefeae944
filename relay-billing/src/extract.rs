//! Create-body extractor accepting JSON or URL-encoded forms.

use axum::{
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde_json::{Map, Value};

use crate::{error::BillingError, stripe::form};

/// A create payload as JSON, whichever encoding the caller used.
///
/// `application/json` is parsed as JSON. `application/x-www-form-urlencoded`
/// is decoded with bracket nesting. Any other or missing content type yields an
/// empty object.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload(pub Value);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

fn body_kind(request: &Request) -> BodyKind {
    let Some(content_type) = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return BodyKind::Other;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if mime == "application/json" || mime.ends_with("+json") {
        BodyKind::Json
    } else if mime == "application/x-www-form-urlencoded" {
        BodyKind::Form
    } else {
        BodyKind::Other
    }
}

impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = BillingError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match body_kind(&req) {
            BodyKind::Json => {
                let Json(value) = Json::<Value>::from_request(req, state)
                    .await
                    .map_err(|e| BillingError::InvalidRequest(e.body_text()))?;
                Ok(Self(value))
            }
            BodyKind::Form => {
                let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                    .await
                    .map_err(|e| BillingError::InvalidRequest(e.body_text()))?;
                Ok(Self(form::unflatten(&pairs)?))
            }
            BodyKind::Other => Ok(Self(Value::Object(Map::new()))),
        }
    }
}
