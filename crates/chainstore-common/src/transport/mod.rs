//! Transport layer.
//!
//! A [`Transport`] performs one request/response exchange with an
//! [`Endpoint`]: it posts a [`Payload`] and returns the complete response
//! body, or classifies the failure as `Unreachable`, `Timeout` or
//! `Transport { status, .. }`. Retrying is layered on top by
//! [`RetryPolicy`] and [`send_with_retry`]; a transport makes exactly one
//! attempt per call.
//!
//! # Components
//!
//! - **[`HttpTransport`]**: pooled hyper client, HTTP and HTTPS
//! - **[`RpcCodec`]**: JSON-RPC 2.0 envelope encoding/decoding
//! - **[`RetryPolicy`]**: fixed-backoff retry of transient failures

pub mod codec;
pub mod http;
pub mod retry;

pub use codec::RpcCodec;
pub use http::{HttpTransport, MAX_RESPONSE_SIZE};
pub use retry::{send_with_retry, RetryPolicy, DEFAULT_RETRY_BACKOFF};

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::Endpoint;
use crate::protocol::error::Result;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// One outbound request body and where to post it.
///
/// `path` is appended to the endpoint's base address; an empty path posts
/// to the base address itself, which is where JSON-RPC endpoints listen.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub path: String,
    pub content_type: String,
    pub body: Bytes,
}

impl Payload {
    /// A JSON-RPC body posted to the endpoint's base address.
    pub fn json_rpc(body: Bytes) -> Self {
        Self {
            path: String::new(),
            content_type: CONTENT_TYPE_JSON.into(),
            body,
        }
    }

    pub fn to_path(path: impl Into<String>, content_type: impl Into<String>, body: Bytes) -> Self {
        Self {
            path: path.into(),
            content_type: content_type.into(),
            body,
        }
    }
}

/// A single request/response exchange with a remote endpoint.
///
/// Implementations must not share one physical connection between two
/// in-flight exchanges, and must return either the whole response body or
/// an error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, endpoint: &Endpoint, payload: Payload, timeout: Duration) -> Result<Bytes>;
}
