//! Blocking request layer for the JPush REST API.
//!
//! # Overview
//! Every call goes through three steps: the builder turns a `CallSpec` into
//! an authenticated `PreparedRequest`, the executor sends it with a bounded
//! retry policy, and the result is wrapped in a `Response` that exposes the
//! status, the raw body and a lazily parsed JSON body.
//!
//! # Design
//! - `HttpClient` carries no mutable state; concurrent calls do not share
//!   connections or buffers.
//! - The network sits behind the `Transport` trait. `UreqTransport` is the
//!   production implementation; tests swap in scripted transports.
//! - Only timeouts and truncated responses are retried, and both draw from
//!   the same attempt budget.
//! - A body that is not JSON never fails a call; `Response::json` returns
//!   `None` and the raw bytes stay available.

pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod response;
pub mod types;

pub use builder::build_request;
pub use client::HttpClient;
pub use config::{ClientConfig, ConnectOptions, RetryPolicy, TransportOptions};
pub use error::{ApiError, AttemptError, BoxError};
pub use executor::{execute_with_retry, Transport, UreqTransport};
pub use http::{HttpMethod, PreparedRequest, RawResponse};
pub use response::Response;
pub use types::{CallSpec, Credentials};
