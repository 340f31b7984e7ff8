//! HTTP(S) transport.
//!
//! Built on hyper's pooled legacy client. The pool hands an idle HTTP/1
//! connection to at most one request at a time, so concurrent exchanges
//! never interleave writes on the same socket; under contention the pool
//! opens another connection instead.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, Request, Uri};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use super::{Payload, Transport};
use crate::config::{Endpoint, PoolConfig};
use crate::protocol::error::{GatewayError, Result};

/// Largest response body accepted (100 MB).
pub const MAX_RESPONSE_SIZE: usize = 100 * 1024 * 1024;

/// Header some daemons use to advertise the full length of a streamed body.
const ADVERTISED_LENGTH: &str = "x-content-length";

/// How much of an error body is kept in the error message.
const ERROR_BODY_PREVIEW: usize = 512;

type HttpClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Pooled HTTP/HTTPS transport.
///
/// Cloning is cheap and clones share the connection pool.
///
/// # Example
///
/// ```no_run
/// use chainstore_common::config::Endpoint;
/// use chainstore_common::transport::{HttpTransport, Payload, RpcCodec, Transport};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let endpoint = Endpoint::rpc("http://127.0.0.1:8545")?;
/// let transport = HttpTransport::new();
///
/// let body = RpcCodec::encode("eth_blockNumber", &[], 1)?;
/// let bytes = transport
///     .send(&endpoint, Payload::json_rpc(body), endpoint.timeout())
///     .await?;
/// let response = RpcCodec::decode(&bytes)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_pool(&PoolConfig::default())
    }

    pub fn with_pool(pool: &PoolConfig) -> Self {
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_millis(pool.idle_timeout_ms))
            .pool_max_idle_per_host(pool.max_idle_per_host)
            .build(connector);

        Self { client }
    }

    fn build_request(endpoint: &Endpoint, payload: Payload) -> Result<Request<Full<Bytes>>> {
        let url = endpoint.url_for(&payload.path);
        let uri: Uri = url
            .parse()
            .map_err(|e| GatewayError::InvalidConfig(format!("Invalid URL '{}': {}", url, e)))?;

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, payload.content_type);

        if let Some(credential) = endpoint.credential() {
            let value = HeaderValue::from_str(&credential.header_value())
                .map_err(|e| GatewayError::InvalidConfig(format!("Invalid credential: {}", e)))?;
            builder = builder.header(AUTHORIZATION, value);
        }

        builder
            .body(Full::new(payload.body))
            .map_err(|e| GatewayError::InvalidRequest(format!("Failed to build request: {}", e)))
    }

    async fn exchange(&self, endpoint: &Endpoint, request: Request<Full<Bytes>>) -> Result<Bytes> {
        let response = self.client.request(request).await.map_err(|e| {
            if e.is_connect() {
                GatewayError::Unreachable(format!("{}: {}", endpoint.address(), error_chain(&e)))
            } else {
                GatewayError::transport(None, error_chain(&e))
            }
        })?;

        let status = response.status();
        let advertised = response
            .headers()
            .get(ADVERTISED_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());

        let body = Limited::new(response.into_body(), MAX_RESPONSE_SIZE)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<http_body_util::LengthLimitError>().is_some() {
                    GatewayError::MalformedResponse(format!(
                        "Response body exceeds {} bytes",
                        MAX_RESPONSE_SIZE
                    ))
                } else {
                    GatewayError::transport(Some(status.as_u16()), format!("Failed to read response: {}", e))
                }
            })?
            .to_bytes();

        if !status.is_success() {
            let preview = &body[..body.len().min(ERROR_BODY_PREVIEW)];
            return Err(GatewayError::transport(
                Some(status.as_u16()),
                String::from_utf8_lossy(preview).into_owned(),
            ));
        }

        if let Some(expected) = advertised {
            if expected != body.len() {
                return Err(GatewayError::MalformedResponse(format!(
                    "Truncated body: advertised {} bytes, received {}",
                    expected,
                    body.len()
                )));
            }
        }

        Ok(body)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, endpoint: &Endpoint, payload: Payload, timeout: Duration) -> Result<Bytes> {
        let request = Self::build_request(endpoint, payload)?;

        tracing::debug!(address = %endpoint.address(), "Sending request");

        // Dropping the exchange on timeout drops its connection with it.
        tokio::time::timeout(timeout, self.exchange(endpoint, request))
            .await
            .map_err(|_| GatewayError::Timeout(timeout.as_millis() as u64))?
    }
}

/// hyper's client errors keep the useful part in their source chain.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
