//! Error types for the push API request layer.
//!
//! # Design
//! `ApiError` is what callers of the verb methods see. `AttemptError` describes
//! how a single network attempt failed; the executor matches on it to decide
//! between retrying and giving up, and a `TimeoutError` keeps the last one as
//! its source. A non-JSON response body is not an error at all, see
//! `Response::json`.

use thiserror::Error;

/// Boxed underlying cause coming from the transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `HttpClient` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The target URL could not be parsed or is not an http(s) URL.
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(#[source] serde_json::Error),

    /// Every attempt timed out or lost the connection mid-response.
    #[error("request failed after {attempts} attempt(s): {source}")]
    TimeoutError {
        attempts: u32,
        #[source]
        source: AttemptError,
    },

    /// A connection-level failure that is not worth retrying.
    #[error("transport error: {0}")]
    TransportError(#[source] BoxError),
}

/// Outcome of one failed attempt, as classified by the transport.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// Connect or read timeout.
    #[error("timed out: {0}")]
    Timeout(#[source] BoxError),

    /// The peer closed the stream before the response was complete.
    #[error("unexpected end of stream: {0}")]
    UnexpectedEof(#[source] BoxError),

    /// Refused connections, DNS and TLS failures and anything else.
    #[error("{0}")]
    Transport(#[source] BoxError),
}

impl AttemptError {
    /// Whether the executor may re-attempt after this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AttemptError::Timeout(_) | AttemptError::UnexpectedEof(_))
    }
}
