//! Chainstore
//!
//! Client core for blockchain gateways: JSON-RPC calls to a node endpoint
//! and content-addressed storage on a storage daemon, singly or as
//! concurrent fan-outs whose results are aggregated in input order.
//!
//! # Crates
//!
//! - [`common`]: protocol types, errors, transport, configuration
//! - [`client`]: the JSON-RPC client
//! - [`store`]: content store clients
//!
//! [`Gateway`] ties one RPC endpoint and one content store together and is
//! built explicitly from a [`GatewayConfig`]; there is no process-wide
//! instance.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use chainstore::{Gateway, GatewayConfig, GatewayValue};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::load("gateway.json")?;
//! let gateway = Gateway::from_config(&config)?;
//!
//! let outcome = gateway
//!     .call_and_put(
//!         &[("eth_blockNumber", vec![])],
//!         vec![Bytes::from_static(b"Hello, IPFS!")],
//!     )
//!     .await;
//!
//! for (i, value) in outcome.successes() {
//!     match value {
//!         GatewayValue::Json(v) => println!("{i}: rpc {v}"),
//!         GatewayValue::Content(id) => println!("{i}: stored {id}"),
//!         GatewayValue::Bytes(b) => println!("{i}: {} bytes", b.len()),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;

pub use chainstore_client as client;
pub use chainstore_common as common;
pub use chainstore_store as store;

pub use chainstore_client::RpcClient;
pub use chainstore_common::{
    AggregatedOutcome, ContentId, Credential, Endpoint, EndpointConfig, EndpointKind, GatewayConfig,
    GatewayError, GatewayValue, OverallStatus, PoolConfig, Result, RpcParams,
};
pub use chainstore_store::{ContentStore, MemoryStore, StoreClient};

use chainstore_common::transport::HttpTransport;

/// One RPC endpoint plus one content store.
///
/// Cloning is cheap; clones share clients, connection pool and
/// outstanding-call table.
#[derive(Clone)]
pub struct Gateway {
    rpc: RpcClient,
    store: Arc<dyn ContentStore>,
}

impl Gateway {
    pub fn new(rpc: RpcClient, store: Arc<dyn ContentStore>) -> Self {
        Self { rpc, store }
    }

    /// Builds both clients over one shared HTTP connection pool.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let transport = HttpTransport::with_pool(&config.pool);
        let rpc = RpcClient::new(config.rpc_endpoint()?, Arc::new(transport.clone()))?;
        let store = StoreClient::new(config.store_endpoint()?, transport)?;
        Ok(Self::new(rpc, Arc::new(store)))
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Stores every payload concurrently; ids come back in input order.
    pub async fn put_many(&self, contents: Vec<Bytes>) -> AggregatedOutcome<ContentId> {
        let handles: Vec<_> = contents
            .into_iter()
            .map(|data| {
                let store = self.store.clone();
                tokio::spawn(async move { store.put(data).await })
            })
            .collect();
        collect_tasks(handles).await
    }

    /// Retrieves every id concurrently; contents come back in input order.
    pub async fn get_many(&self, ids: &[ContentId]) -> AggregatedOutcome<Bytes> {
        let handles: Vec<_> = ids
            .iter()
            .cloned()
            .map(|id| {
                let store = self.store.clone();
                tokio::spawn(async move { store.get(&id).await })
            })
            .collect();
        collect_tasks(handles).await
    }

    /// Runs RPC calls and store puts as one fan-out.
    ///
    /// The RPC results come first, in call order, followed by the content
    /// ids in payload order.
    pub async fn call_and_put<M>(
        &self,
        calls: &[(M, RpcParams)],
        contents: Vec<Bytes>,
    ) -> AggregatedOutcome<GatewayValue>
    where
        M: AsRef<str>,
    {
        let (rpc, stored) = tokio::join!(self.rpc.call_many(calls), self.put_many(contents));

        let results = rpc
            .map(GatewayValue::Json)
            .into_iter()
            .chain(stored.map(GatewayValue::Content))
            .collect::<AggregatedOutcome<_>>();

        tracing::debug!(
            entries = results.len(),
            status = ?results.status(),
            "Gateway fan-out complete"
        );
        results
    }

    /// Store health check.
    pub async fn ping(&self) -> Result<bool> {
        self.store.ping().await
    }

    /// Shuts down the RPC client; outstanding calls fail with `Shutdown`.
    pub fn shutdown(&self) {
        self.rpc.shutdown();
    }
}

async fn collect_tasks<T>(handles: Vec<tokio::task::JoinHandle<Result<T>>>) -> AggregatedOutcome<T> {
    join_all(handles)
        .await
        .into_iter()
        .map(|joined| {
            joined.unwrap_or_else(|e| {
                Err(GatewayError::TaskFailed(format!("store task: {}", e)))
            })
        })
        .collect()
}
