//! Caller-facing view of a raw response.
//!
//! The body is parsed as JSON on first access and the result is cached. A
//! body that is empty or not valid JSON yields `None` from `json()`; the raw
//! bytes stay available either way.

use std::borrow::Cow;
use std::cell::OnceCell;

use serde_json::Value;
use tracing::debug;

use crate::http::{find_header, RawResponse};

/// Normalized response returned by every `HttpClient` call.
#[derive(Debug, Clone)]
pub struct Response {
    raw: RawResponse,
    parsed: OnceCell<Option<Value>>,
}

impl Response {
    pub fn new(raw: RawResponse) -> Self {
        Self {
            raw,
            parsed: OnceCell::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.raw.status
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.raw.status)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.raw.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.raw.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Whether the server labelled the body as JSON.
    pub fn is_json(&self) -> bool {
        self.content_type().is_some_and(|ct| {
            let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
    }

    /// Raw body bytes, untouched.
    pub fn body(&self) -> &[u8] {
        &self.raw.body
    }

    /// Raw body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw.body)
    }

    /// Parsed JSON body, or `None` when the body is empty or not JSON.
    pub fn json(&self) -> Option<&Value> {
        self.parsed.get_or_init(|| parse_body(&self.raw)).as_ref()
    }

    pub fn into_raw(self) -> RawResponse {
        self.raw
    }
}

impl From<RawResponse> for Response {
    fn from(raw: RawResponse) -> Self {
        Response::new(raw)
    }
}

fn parse_body(raw: &RawResponse) -> Option<Value> {
    if raw.body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(&raw.body) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(status = raw.status, error = %e, "response body is not JSON");
            None
        }
    }
}
