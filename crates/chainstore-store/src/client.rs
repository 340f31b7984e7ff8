use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use chainstore_common::config::{Endpoint, EndpointConfig, EndpointKind, PoolConfig};
use chainstore_common::protocol::{ContentId, GatewayError, Result};
use chainstore_common::transport::{send_with_retry, HttpTransport, Payload, Transport};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::multipart::FormFile;
use crate::store::ContentStore;

const ADD_PATH: &str = "/api/v0/add?pin=true&cid-version=0";
const CAT_PATH: &str = "/api/v0/cat";
const ID_PATH: &str = "/api/v0/id";

/// One line of an `add` answer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddEntry {
    hash: Option<String>,
}

/// The daemon's error body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DaemonError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Identity {
    #[serde(rename = "ID", default)]
    id: Option<String>,
}

/// Client for a storage daemon's HTTP API.
///
/// # Example
///
/// ```no_run
/// use bytes::Bytes;
/// use chainstore_common::Endpoint;
/// use chainstore_store::{ContentStore, StoreClient};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = StoreClient::http(Endpoint::content_store("http://127.0.0.1:5001")?)?;
///
/// let id = store.put(Bytes::from_static(b"Hello, IPFS!")).await?;
/// let data = store.get(&id).await?;
/// assert_eq!(&data[..], b"Hello, IPFS!");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct StoreClient<T = HttpTransport> {
    endpoint: Endpoint,
    transport: T,
}

impl StoreClient<HttpTransport> {
    pub fn http(endpoint: Endpoint) -> Result<Self> {
        Self::new(endpoint, HttpTransport::new())
    }

    pub fn from_config(config: &EndpointConfig, pool: &PoolConfig) -> Result<Self> {
        let endpoint = Endpoint::new(EndpointKind::ContentStore, config)?;
        Self::new(endpoint, HttpTransport::with_pool(pool))
    }
}

impl<T: Transport> StoreClient<T> {
    /// # Errors
    ///
    /// `InvalidConfig` if the endpoint is not a content-store endpoint.
    pub fn new(endpoint: Endpoint, transport: T) -> Result<Self> {
        if endpoint.kind() != EndpointKind::ContentStore {
            return Err(GatewayError::InvalidConfig(format!(
                "{} is not a content-store endpoint",
                endpoint.address()
            )));
        }

        tracing::info!(address = %endpoint.address(), "Store client created");

        Ok(Self {
            endpoint,
            transport,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn post(&self, payload: Payload) -> Result<Bytes> {
        send_with_retry(&self.transport, &self.endpoint, payload).await
    }
}

impl<T> fmt::Debug for StoreClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: Transport + 'static> ContentStore for StoreClient<T> {
    async fn put(&self, data: Bytes) -> Result<ContentId> {
        let size = data.len();
        let (content_type, body) = FormFile::new("file", "blob", data).encode();

        let answer = self
            .post(Payload::to_path(ADD_PATH, content_type, body))
            .await
            .map_err(|e| match e {
                GatewayError::Transport {
                    status: Some(_),
                    message,
                } => GatewayError::StoreRejected(daemon_message(&message)),
                other => other,
            })?;

        // The answer is one JSON object per line; the last names the root.
        let hash = answer
            .split(|b| *b == b'\n')
            .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
            .filter_map(|line| serde_json::from_slice::<AddEntry>(line).ok())
            .filter_map(|entry| entry.hash)
            .last()
            .ok_or_else(|| {
                GatewayError::MalformedResponse("add answer carries no Hash".into())
            })?;

        let id = ContentId::parse(&hash)
            .map_err(|e| GatewayError::MalformedResponse(format!("daemon returned {}", e)))?;

        tracing::debug!(id = %id, size, "Stored content");
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> Result<Bytes> {
        let path = format!(
            "{}?arg={}",
            CAT_PATH,
            utf8_percent_encode(id.as_str(), NON_ALPHANUMERIC)
        );

        let data = self
            .post(Payload::to_path(path, "text/plain", Bytes::new()))
            .await
            .map_err(|e| match e {
                GatewayError::Transport {
                    status: Some(status),
                    message,
                } if status == 404 || daemon_message(&message).to_lowercase().contains("not found") => {
                    GatewayError::NotFound(id.to_string())
                }
                other => other,
            })?;

        tracing::debug!(id = %id, size = data.len(), "Retrieved content");
        Ok(data)
    }

    async fn ping(&self) -> Result<bool> {
        // Health checks report the first failure; no retry.
        let answer = self
            .transport
            .send(
                &self.endpoint,
                Payload::to_path(ID_PATH, "text/plain", Bytes::new()),
                self.endpoint.timeout(),
            )
            .await?;

        let alive = serde_json::from_slice::<Identity>(&answer)
            .ok()
            .and_then(|identity| identity.id)
            .is_some_and(|id| !id.is_empty());

        tracing::debug!(address = %self.endpoint.address(), alive, "Pinged store");
        Ok(alive)
    }
}

/// Extracts `Message` from a daemon error body, or returns the body as is.
fn daemon_message(body: &str) -> String {
    serde_json::from_str::<DaemonError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
