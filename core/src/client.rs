//! Verb-level entry points for the push API.
//!
//! # Design
//! `HttpClient` holds credentials, configuration and a transport, none of
//! which change between calls. Every verb method builds a `CallSpec` and goes
//! through `request`: build, execute with retries, normalize.

use serde::Serialize;

use crate::builder::build_request;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::executor::{execute_with_retry, Transport, UreqTransport};
use crate::http::HttpMethod;
use crate::response::Response;
use crate::types::{CallSpec, Credentials};

/// Blocking client for the push service REST API.
///
/// Calls are independent: each one prepares its own request and opens its
/// own connection per attempt, so a shared `&HttpClient` can be used from
/// several threads when the transport allows it.
#[derive(Debug, Clone)]
pub struct HttpClient<T = UreqTransport> {
    credentials: Credentials,
    config: ClientConfig,
    transport: T,
}

impl HttpClient<UreqTransport> {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_transport(credentials, UreqTransport)
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn with_transport(credentials: Credentials, transport: T) -> Self {
        Self {
            credentials,
            config: ClientConfig::default(),
            transport,
        }
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn get(&self, url: &str, params: &[(&str, &str)], headers: &[(&str, &str)]) -> Result<Response, ApiError> {
        self.request(CallSpec::new(HttpMethod::Get, url).params(params).headers(headers))
    }

    pub fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        headers: &[(&str, &str)],
    ) -> Result<Response, ApiError> {
        self.request(CallSpec::new(HttpMethod::Post, url).json(body)?.headers(headers))
    }

    pub fn put<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
        headers: &[(&str, &str)],
    ) -> Result<Response, ApiError> {
        self.request(CallSpec::new(HttpMethod::Put, url).json(body)?.headers(headers))
    }

    pub fn delete(&self, url: &str, params: &[(&str, &str)], headers: &[(&str, &str)]) -> Result<Response, ApiError> {
        self.request(CallSpec::new(HttpMethod::Delete, url).params(params).headers(headers))
    }

    /// Execute an arbitrary call. Per-call transport options take precedence
    /// over the client's.
    pub fn request(&self, call: CallSpec) -> Result<Response, ApiError> {
        let prepared = build_request(&self.credentials, &call)?;
        let options = call.options.merged_over(&self.config.transport).resolve(&prepared.url);
        let raw = execute_with_retry(&self.transport, &self.config.retry, &prepared, &options)?;
        Ok(Response::new(raw))
    }
}
