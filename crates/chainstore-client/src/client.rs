use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chainstore_common::config::{Endpoint, EndpointConfig, EndpointKind, PoolConfig};
use chainstore_common::outcome::AggregatedOutcome;
use chainstore_common::protocol::error::{GatewayError, Result};
use chainstore_common::protocol::{IdSequence, RequestId, RpcParams, RpcRequest};
use chainstore_common::transport::{send_with_retry, HttpTransport, Payload, RpcCodec, Transport};
use futures::future::join_all;
use serde_json::Value;
use tokio::time::Instant;

use crate::outstanding::OutstandingCalls;

struct Inner {
    endpoint: Endpoint,
    transport: Arc<dyn Transport>,
    ids: IdSequence,
    table: OutstandingCalls,
    closed: AtomicBool,
}

/// JSON-RPC client bound to one endpoint.
///
/// Clones share the id sequence, the outstanding-call table and the
/// transport, so a clone can be moved into a spawned task cheaply.
///
/// # Example
///
/// ```no_run
/// use chainstore_client::RpcClient;
/// use chainstore_common::Endpoint;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RpcClient::http(Endpoint::rpc("http://127.0.0.1:8545")?)?;
///
/// let height = client.call("eth_blockNumber", vec![]).await?;
///
/// let outcome = client
///     .call_many(&[
///         ("eth_blockNumber", vec![]),
///         ("eth_getBalance", vec![json!("0xabc"), json!("latest")]),
///     ])
///     .await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RpcClient {
    inner: Arc<Inner>,
}

impl RpcClient {
    /// Creates a client for `endpoint` over `transport`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the endpoint is not an RPC endpoint.
    pub fn new(endpoint: Endpoint, transport: Arc<dyn Transport>) -> Result<Self> {
        if endpoint.kind() != EndpointKind::Rpc {
            return Err(GatewayError::InvalidConfig(format!(
                "{} is not an RPC endpoint",
                endpoint.address()
            )));
        }

        tracing::info!(address = %endpoint.address(), "RPC client created");

        Ok(Self {
            inner: Arc::new(Inner {
                endpoint,
                transport,
                ids: IdSequence::new(),
                table: OutstandingCalls::new(),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Creates a client over a fresh pooled HTTP transport.
    pub fn http(endpoint: Endpoint) -> Result<Self> {
        Self::new(endpoint, Arc::new(HttpTransport::new()))
    }

    pub fn from_config(config: &EndpointConfig, pool: &PoolConfig) -> Result<Self> {
        let endpoint = Endpoint::new(EndpointKind::Rpc, config)?;
        Self::new(endpoint, Arc::new(HttpTransport::with_pool(pool)))
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    /// Number of calls currently registered.
    pub fn outstanding(&self) -> usize {
        self.inner.table.len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Fails every outstanding call with `Shutdown` and rejects new ones.
    ///
    /// Applies to every clone of this client.
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let overdue = self.inner.table.overdue(Instant::now());
        let cancelled = self.inner.table.cancel_all(GatewayError::Shutdown);
        tracing::info!(
            address = %self.inner.endpoint.address(),
            cancelled,
            overdue,
            "RPC client shut down"
        );
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_shutdown() {
            Err(GatewayError::Shutdown)
        } else {
            Ok(())
        }
    }

    /// Deadline for an exchange started now: every attempt timing out plus
    /// the backoff between them.
    fn deadline(&self) -> Instant {
        let endpoint = &self.inner.endpoint;
        Instant::now() + endpoint.retry_policy().budget(endpoint.timeout())
    }

    fn deadline_error(&self) -> GatewayError {
        let endpoint = &self.inner.endpoint;
        GatewayError::Timeout(endpoint.retry_policy().budget(endpoint.timeout()).as_millis() as u64)
    }

    /// Invokes `method` and waits for its result.
    ///
    /// # Errors
    ///
    /// - `Unreachable` / `Timeout` / `Transport` from the exchange, after
    ///   the endpoint's retry policy is exhausted
    /// - `MalformedResponse` if the answer cannot be decoded or echoes the
    ///   wrong id
    /// - `Protocol` if the node answered with an error object
    /// - `Shutdown` if the client was shut down before the answer arrived
    pub async fn call(&self, method: &str, params: RpcParams) -> Result<Value> {
        self.ensure_open()?;

        let inner = &*self.inner;
        let mut pending = inner.table.register(&inner.ids, method, self.deadline());
        let id = pending.id();

        tracing::debug!(method, id, "Dispatching call");

        let exchange = self.exchange(method, &params, id);
        tokio::pin!(exchange);

        let waited = tokio::time::timeout_at(pending.deadline(), async {
            tokio::select! {
                // Filled early only by shutdown.
                result = pending.recv() => result,
                answer = &mut exchange => {
                    match answer {
                        Ok(response) => inner.table.deliver(response),
                        Err(e) => inner.table.fail(id, e),
                    };
                    pending.recv().await
                }
            }
        })
        .await;

        waited.unwrap_or_else(|_| Err(self.deadline_error()))
    }

    async fn exchange(
        &self,
        method: &str,
        params: &[Value],
        id: RequestId,
    ) -> Result<chainstore_common::RpcResponse> {
        let inner = &*self.inner;
        let body = RpcCodec::encode(method, params, id)?;
        let bytes = send_with_retry(inner.transport.as_ref(), &inner.endpoint, Payload::json_rpc(body)).await?;
        let response = RpcCodec::decode(&bytes)?;

        if response.id != id {
            tracing::warn!(
                method,
                id,
                received = response.id,
                "Discarding response with mismatched id"
            );
            return Err(GatewayError::MalformedResponse(format!(
                "expected response id {}, got {}",
                id, response.id
            )));
        }

        Ok(response)
    }

    /// Dispatches every call concurrently and collects the results in input
    /// order.
    ///
    /// Each call runs in its own task with its own deadline; a failure (or
    /// panic) in one task is recorded as that entry's error and does not
    /// affect the others.
    pub async fn call_many<M>(&self, calls: &[(M, RpcParams)]) -> AggregatedOutcome<Value>
    where
        M: AsRef<str>,
    {
        let handles: Vec<_> = calls
            .iter()
            .map(|(method, params)| {
                let client = self.clone();
                let method = method.as_ref().to_string();
                let params = params.clone();
                tokio::spawn(async move { client.call(&method, params).await })
            })
            .collect();

        let results = join_all(handles)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    Err(GatewayError::TaskFailed(format!("call task: {}", e)))
                })
            })
            .collect();

        let outcome = AggregatedOutcome::from_results(results);
        tracing::debug!(calls = outcome.len(), status = ?outcome.status(), "Fan-out complete");
        outcome
    }

    /// Sends every call in one JSON-RPC batch request.
    ///
    /// Answers are routed back by id. Entries the node never answered fail
    /// with `MalformedResponse`; a transport failure fails every entry.
    pub async fn call_batch<M>(&self, calls: &[(M, RpcParams)]) -> AggregatedOutcome<Value>
    where
        M: AsRef<str>,
    {
        if calls.is_empty() {
            return AggregatedOutcome::from_results(Vec::new());
        }
        if let Err(e) = self.ensure_open() {
            return calls.iter().map(|_| Err(e.clone())).collect();
        }

        let inner = &*self.inner;
        let deadline = self.deadline();
        let mut pending: Vec<_> = calls
            .iter()
            .map(|(method, _)| inner.table.register(&inner.ids, method.as_ref(), deadline))
            .collect();

        let requests: Vec<_> = calls
            .iter()
            .zip(&pending)
            .map(|((method, params), p)| RpcRequest::new(p.id(), method.as_ref(), params.clone()))
            .collect();
        let batch_ids: HashSet<RequestId> = requests.iter().map(|r| r.id).collect();

        tracing::debug!(calls = requests.len(), "Dispatching batch");

        let exchange = async {
            let body = RpcCodec::encode_batch(&requests)?;
            let bytes = send_with_retry(inner.transport.as_ref(), &inner.endpoint, Payload::json_rpc(body)).await?;
            RpcCodec::decode_batch(&bytes)
        };

        let answered = tokio::time::timeout_at(deadline, exchange)
            .await
            .unwrap_or_else(|_| Err(self.deadline_error()));

        match answered {
            Ok(responses) => {
                for response in responses {
                    if batch_ids.contains(&response.id) {
                        inner.table.deliver(response);
                    } else {
                        tracing::warn!(id = response.id, "Discarding batch answer for foreign id");
                    }
                }
            }
            Err(e) => {
                for p in &pending {
                    inner.table.fail(p.id(), e.clone());
                }
            }
        }

        let results = pending
            .iter_mut()
            .map(|p| {
                p.try_recv().unwrap_or_else(|| {
                    Err(GatewayError::MalformedResponse(format!(
                        "batch answer has no entry for id {}",
                        p.id()
                    )))
                })
            })
            .collect();

        AggregatedOutcome::from_results(results)
    }
}
