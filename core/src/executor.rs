//! Sends prepared requests and owns the retry loop.
//!
//! # Design
//! A `Transport` performs exactly one attempt over one fresh connection and
//! classifies its failure. `execute_with_retry` is the only place that
//! decides whether to try again: timeouts and truncated responses consume one
//! attempt each until the policy runs out, everything else is returned at
//! once.

use std::io;
use std::thread;

use tracing::{debug, warn};
use ureq::{Agent, RequestBuilder};
use url::Url;

use crate::config::{ConnectOptions, RetryPolicy};
use crate::error::{ApiError, AttemptError};
use crate::http::{HttpMethod, PreparedRequest, RawResponse};

/// One network attempt.
pub trait Transport {
    fn send(&self, request: &PreparedRequest, options: &ConnectOptions) -> Result<RawResponse, AttemptError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &PreparedRequest, options: &ConnectOptions) -> Result<RawResponse, AttemptError> {
        (**self).send(request, options)
    }
}

/// Blocking transport backed by `ureq`.
///
/// A new agent is built for every attempt, so nothing is pooled between
/// attempts or calls and the connection is released when the attempt returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn send(&self, request: &PreparedRequest, options: &ConnectOptions) -> Result<RawResponse, AttemptError> {
        let agent = Agent::config_builder()
            .timeout_connect(Some(options.open_timeout))
            .timeout_recv_response(Some(options.read_timeout))
            .timeout_recv_body(Some(options.read_timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();

        let url = connection_url(&request.url, options.use_tls);
        let uri = url.as_str();
        let headers = &request.headers;

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, None) => with_headers(agent.get(uri), headers).call(),
            (HttpMethod::Get, Some(body)) => with_headers(agent.get(uri), headers).force_send_body().send(body),
            (HttpMethod::Delete, None) => with_headers(agent.delete(uri), headers).call(),
            (HttpMethod::Delete, Some(body)) => {
                with_headers(agent.delete(uri), headers).force_send_body().send(body)
            }
            (HttpMethod::Post, Some(body)) => with_headers(agent.post(uri), headers).send(body),
            (HttpMethod::Post, None) => with_headers(agent.post(uri), headers).send_empty(),
            (HttpMethod::Put, Some(body)) => with_headers(agent.put(uri), headers).send(body),
            (HttpMethod::Put, None) => with_headers(agent.put(uri), headers).send_empty(),
        };
        let mut response = result.map_err(classify)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.body_mut().read_to_vec().map_err(classify)?;

        Ok(RawResponse { status, headers, body })
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// URL actually dialed. When `use_tls` disagrees with the scheme the scheme
/// is switched but the port stays what the original URL implied.
pub(crate) fn connection_url(url: &Url, use_tls: bool) -> Url {
    let wanted = if use_tls { "https" } else { "http" };
    if url.scheme() == wanted {
        return url.clone();
    }
    let mut url = url.clone();
    let port = url.port_or_known_default();
    if url.set_scheme(wanted).is_ok() {
        let _ = url.set_port(port);
    }
    url
}

fn classify(err: ureq::Error) -> AttemptError {
    let io_kind = match &err {
        ureq::Error::Io(io) => Some(io.kind()),
        _ => None,
    };
    match io_kind {
        _ if matches!(err, ureq::Error::Timeout(_)) => AttemptError::Timeout(Box::new(err)),
        Some(io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => AttemptError::Timeout(Box::new(err)),
        Some(io::ErrorKind::UnexpectedEof) => AttemptError::UnexpectedEof(Box::new(err)),
        _ => AttemptError::Transport(Box::new(err)),
    }
}

/// Send `request`, re-attempting on timeouts and truncated responses.
///
/// Returns `TimeoutError` once `policy` runs out of attempts and
/// `TransportError` immediately for any other failure.
pub fn execute_with_retry<T: Transport>(
    transport: &T,
    policy: &RetryPolicy,
    request: &PreparedRequest,
    options: &ConnectOptions,
) -> Result<RawResponse, ApiError> {
    let max_attempts = policy.attempts();
    let mut remaining = max_attempts;

    loop {
        let attempt = max_attempts - remaining + 1;
        debug!(method = %request.method, url = %request.url, attempt, "sending request");

        match transport.send(request, options) {
            Ok(response) => {
                debug!(status = response.status, attempt, "received response");
                return Ok(response);
            }
            Err(err @ (AttemptError::Timeout(_) | AttemptError::UnexpectedEof(_))) => {
                remaining -= 1;
                if remaining == 0 {
                    warn!(url = %request.url, attempts = max_attempts, error = %err, "giving up");
                    return Err(ApiError::TimeoutError {
                        attempts: max_attempts,
                        source: err,
                    });
                }
                warn!(url = %request.url, attempt, remaining, error = %err, "retrying request");
                if !policy.retry_delay.is_zero() {
                    thread::sleep(policy.retry_delay);
                }
            }
            Err(AttemptError::Transport(source)) => {
                debug!(url = %request.url, attempt, error = %source, "transport failure");
                return Err(ApiError::TransportError(source));
            }
        }
    }
}
