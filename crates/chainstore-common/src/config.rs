//! Endpoint and gateway configuration.
//!
//! Configuration is plain JSON with camelCase keys:
//!
//! ```json
//! {
//!   "rpc":   { "address": "https://mainnet.example.org/v3", "timeoutMs": 5000 },
//!   "store": { "address": "http://127.0.0.1:5001", "maxRetries": 2, "credential": "user:pass" },
//!   "pool":  { "maxIdlePerHost": 16 }
//! }
//! ```
//!
//! [`EndpointConfig`] is the serializable form; [`Endpoint`] is the
//! validated, immutable value the clients hold.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::Credential;
use crate::protocol::error::{GatewayError, Result};
use crate::transport::retry::{RetryPolicy, DEFAULT_RETRY_BACKOFF};

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Which protocol an endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndpointKind {
    Rpc,
    ContentStore,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_backoff_ms() -> u64 {
    DEFAULT_RETRY_BACKOFF.as_millis() as u64
}

/// Serializable endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EndpointConfig {
    pub address: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,
}

impl EndpointConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: default_retry_backoff_ms(),
            credential: None,
        }
    }
}

/// A validated remote endpoint.
///
/// Immutable once built; the `with_*` methods return modified copies.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    kind: EndpointKind,
    address: String,
    credential: Option<Credential>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl Endpoint {
    /// Validates `config` into an endpoint of the given kind.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the address is not an `http://` or `https://` URL
    /// or the timeout is zero.
    pub fn new(kind: EndpointKind, config: &EndpointConfig) -> Result<Self> {
        let address = config.address.trim().trim_end_matches('/');

        if !address.starts_with("http://") && !address.starts_with("https://") {
            return Err(GatewayError::InvalidConfig(format!(
                "address must start with http:// or https://, got '{}'",
                config.address
            )));
        }

        let uri: hyper::Uri = address.parse().map_err(|e| {
            GatewayError::InvalidConfig(format!("invalid address '{}': {}", config.address, e))
        })?;
        if uri.host().map_or(true, str::is_empty) {
            return Err(GatewayError::InvalidConfig(format!(
                "address has no host: '{}'",
                config.address
            )));
        }

        if config.timeout_ms == 0 {
            return Err(GatewayError::InvalidConfig("timeoutMs must be greater than 0".into()));
        }

        Ok(Self {
            kind,
            address: address.to_string(),
            credential: config.credential.clone().filter(|c| !c.is_empty()),
            timeout: Duration::from_millis(config.timeout_ms),
            retry: RetryPolicy::new(config.max_retries, Duration::from_millis(config.retry_backoff_ms)),
        })
    }

    /// An RPC endpoint with default timeout and retry.
    pub fn rpc(address: &str) -> Result<Self> {
        Self::new(EndpointKind::Rpc, &EndpointConfig::new(address))
    }

    /// A content-store endpoint with default timeout and retry.
    pub fn content_store(address: &str) -> Result<Self> {
        Self::new(EndpointKind::ContentStore, &EndpointConfig::new(address))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    /// Base address, without trailing slash.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Joins `path` (which may carry a query) onto the base address.
    pub fn url_for(&self, path: &str) -> String {
        if path.is_empty() {
            self.address.clone()
        } else if path.starts_with('/') {
            format!("{}{}", self.address, path)
        } else {
            format!("{}/{}", self.address, path)
        }
    }
}

/// Connection pool settings shared by every endpoint of a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PoolConfig {
    pub max_idle_per_host: usize,
    pub idle_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 16,
            idle_timeout_ms: 90_000,
        }
    }
}

/// Everything needed to build a gateway: one RPC endpoint, one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GatewayConfig {
    pub rpc: EndpointConfig,
    pub store: EndpointConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

impl GatewayConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GatewayError::InvalidConfig(format!("failed to parse config: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::InvalidConfig(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn rpc_endpoint(&self) -> Result<Endpoint> {
        Endpoint::new(EndpointKind::Rpc, &self.rpc)
    }

    pub fn store_endpoint(&self) -> Result<Endpoint> {
        Endpoint::new(EndpointKind::ContentStore, &self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_applied() {
        let config: EndpointConfig = serde_json::from_str(r#"{"address":"http://localhost:8545"}"#).unwrap();
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.retry_backoff_ms, 200);
        assert!(config.credential.is_none());

        let endpoint = Endpoint::new(EndpointKind::Rpc, &config).unwrap();
        assert_eq!(endpoint.timeout(), Duration::from_secs(10));
        assert_eq!(endpoint.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: std::result::Result<EndpointConfig, _> =
            serde_json::from_str(r#"{"address":"http://localhost","timeout":5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_address_validation() {
        for bad in ["localhost:8545", "ftp://host", "", "http://"] {
            let err = Endpoint::new(EndpointKind::Rpc, &EndpointConfig::new(bad)).unwrap_err();
            assert!(matches!(err, GatewayError::InvalidConfig(_)), "{bad}: {err:?}");
        }
        assert!(Endpoint::rpc("https://rpc.example.org/v3/key").is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = EndpointConfig::new("http://localhost:5001");
        config.timeout_ms = 0;
        assert!(Endpoint::new(EndpointKind::ContentStore, &config).is_err());
    }

    #[test]
    fn test_url_for() {
        let endpoint = Endpoint::content_store("http://127.0.0.1:5001/").unwrap();
        assert_eq!(endpoint.address(), "http://127.0.0.1:5001");
        assert_eq!(endpoint.url_for(""), "http://127.0.0.1:5001");
        assert_eq!(
            endpoint.url_for("/api/v0/cat?arg=Qm"),
            "http://127.0.0.1:5001/api/v0/cat?arg=Qm"
        );
        assert_eq!(endpoint.url_for("api/v0/id"), "http://127.0.0.1:5001/api/v0/id");
    }

    #[test]
    fn test_empty_credential_ignored() {
        let mut config = EndpointConfig::new("http://localhost");
        config.credential = Some(Credential::new(""));
        let endpoint = Endpoint::new(EndpointKind::Rpc, &config).unwrap();
        assert!(endpoint.credential().is_none());
    }

    #[test]
    fn test_gateway_config_from_json() {
        let config = GatewayConfig::from_json(
            r#"{
                "rpc": {"address": "http://localhost:8545", "timeoutMs": 5000},
                "store": {"address": "http://localhost:5001", "maxRetries": 3, "credential": "tok"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.pool, PoolConfig::default());
        let rpc = config.rpc_endpoint().unwrap();
        assert_eq!(rpc.kind(), EndpointKind::Rpc);
        assert_eq!(rpc.timeout(), Duration::from_millis(5000));

        let store = config.store_endpoint().unwrap();
        assert_eq!(store.kind(), EndpointKind::ContentStore);
        assert_eq!(store.retry_policy().max_retries, 3);
        assert_eq!(store.credential(), Some(&Credential::new("tok")));
    }

    #[test]
    fn test_gateway_config_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"rpc":{{"address":"http://a:1"}},"store":{{"address":"http://b:2"}},"pool":{{"maxIdlePerHost":4}}}}"#
        )
        .unwrap();

        let config = GatewayConfig::load(file.path()).unwrap();
        assert_eq!(config.pool.max_idle_per_host, 4);
        assert_eq!(config.pool.idle_timeout_ms, 90_000);
    }

    #[test]
    fn test_gateway_config_load_missing_file() {
        let err = GatewayConfig::load("/nonexistent/gateway.json").unwrap_err();
        assert!(matches!(err, GatewayError::InvalidConfig(_)));
    }
}
