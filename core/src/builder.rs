//! Turns a `CallSpec` into a `PreparedRequest`.
//!
//! Query parameters are form-encoded onto the URL, caller headers are merged
//! over `DEFAULT_HEADERS`, the body is encoded as JSON text, and the basic
//! `authorization` header is set last so callers cannot replace it.

use url::Url;

use crate::config::DEFAULT_HEADERS;
use crate::error::ApiError;
use crate::http::PreparedRequest;
use crate::types::{CallSpec, Credentials};

const AUTHORIZATION: &str = "authorization";

/// Build the wire request for `call`, authenticated with `credentials`.
pub fn build_request(credentials: &Credentials, call: &CallSpec) -> Result<PreparedRequest, ApiError> {
    let mut url = parse_url(&call.url)?;
    if !call.params.is_empty() {
        url.query_pairs_mut().extend_pairs(call.params.iter());
    }

    let body = call
        .body
        .as_ref()
        .map(serde_json::to_vec)
        .transpose()
        .map_err(ApiError::SerializationError)?;

    Ok(PreparedRequest {
        method: call.method,
        url,
        headers: merge_headers(&call.headers, credentials.basic_auth()),
        body,
    })
}

fn parse_url(raw: &str) -> Result<Url, ApiError> {
    let invalid = |reason: String| ApiError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Defaults first (overridden in place), then extra caller headers in order,
/// then `authorization`.
fn merge_headers(overrides: &[(String, String)], authorization: String) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = DEFAULT_HEADERS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    for (name, value) in overrides {
        let name = name.to_ascii_lowercase();
        if name == AUTHORIZATION {
            continue;
        }
        match headers.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value.clone(),
            None => headers.push((name, value.clone())),
        }
    }

    headers.push((AUTHORIZATION.to_string(), authorization));
    headers
}
