// src/services/relay.rs
use axum::body::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue, InvalidHeaderValue};
use serde_json::Value;
use url::Url;

use crate::error::AppError;

/// Forward `body` unchanged to `url` and parse the reply as JSON.
///
/// `authorization` is sent verbatim as the `Authorization` header when present.
/// The upstream status code is not inspected: whatever JSON comes back is
/// handed to the caller as-is.
pub async fn forward_json(
    http: &reqwest::Client,
    url: Url,
    authorization: Option<HeaderValue>,
    body: Bytes,
) -> Result<Value, AppError> {
    let mut req = http
        .post(url)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .body(body);
    if let Some(auth) = authorization {
        req = req.header(AUTHORIZATION, auth);
    }

    let res = req.send().await?;
    tracing::debug!(status = %res.status(), "runner responded");

    Ok(res.json::<Value>().await?)
}

/// `Bearer <token>` header value; marked sensitive so it never shows up in debug output.
pub fn bearer(token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
    value.set_sensitive(true);
    Ok(value)
}
