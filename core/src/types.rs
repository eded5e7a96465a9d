//! Caller-supplied inputs: credentials and the description of one call.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use serde_json::Value;

use crate::config::TransportOptions;
use crate::error::ApiError;
use crate::http::HttpMethod;

/// Application key and master secret for the push service.
///
/// Only used to compute the `authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_key: String,
    pub master_secret: String,
}

impl Credentials {
    pub fn new(app_key: impl Into<String>, master_secret: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            master_secret: master_secret.into(),
        }
    }

    /// `Basic` authorization header value.
    pub fn basic_auth(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.app_key, self.master_secret));
        format!("Basic {token}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_key", &self.app_key)
            .field("master_secret", &"<redacted>")
            .finish()
    }
}

/// One logical call before it is encoded for the wire.
///
/// The body is serialized when it is attached, so an unserializable payload
/// fails before anything touches the network.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSpec {
    pub method: HttpMethod,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub options: TransportOptions,
}

impl CallSpec {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            body: None,
            headers: Vec::new(),
            options: TransportOptions::default(),
        }
    }

    pub fn params<K, V>(mut self, params: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.params = owned_pairs(params);
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(ApiError::SerializationError)?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn headers<K, V>(mut self, headers: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.headers = owned_pairs(headers);
        self
    }

    pub fn options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }
}

fn owned_pairs<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .collect()
}
