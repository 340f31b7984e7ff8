//! Chainstore Gateway Integration Tests
//!
//! End-to-end tests for the [`Gateway`] facade:
//! - Building a gateway from a configuration file
//! - Heterogeneous fan-out (RPC calls and store puts) with ordered results
//! - Failure isolation between the RPC and store halves
//! - Shutdown

use async_trait::async_trait;
use bytes::Bytes;
use chainstore::common::protocol::{IncomingRequest, JsonRpcError, JsonRpcResponse};
use chainstore::common::transport::{Payload, Transport};
use chainstore::{
    ContentId, ContentStore, Endpoint, Gateway, GatewayConfig, GatewayError, GatewayValue,
    MemoryStore, OverallStatus, Result, RpcClient,
};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

fn node_answer(req: IncomingRequest) -> JsonRpcResponse {
    match req.method.as_str() {
        "eth_blockNumber" => JsonRpcResponse::success(req.id, json!("0x10")),
        "eth_gasPrice" => JsonRpcResponse::success(req.id, json!("0x3b9aca00")),
        _ => JsonRpcResponse::error(req.id, JsonRpcError::method_not_found()),
    }
}

/// In-process node.
struct StubNode;

#[async_trait]
impl Transport for StubNode {
    async fn send(&self, _: &Endpoint, payload: Payload, _: Duration) -> Result<Bytes> {
        let req: IncomingRequest = serde_json::from_slice(&payload.body).unwrap();
        Ok(Bytes::from(serde_json::to_vec(&node_answer(req)).unwrap()))
    }
}

/// A store that refuses everything.
#[derive(Debug)]
struct FullStore;

#[async_trait]
impl ContentStore for FullStore {
    async fn put(&self, _: Bytes) -> Result<ContentId> {
        Err(GatewayError::StoreRejected("disk full".into()))
    }

    async fn get(&self, id: &ContentId) -> Result<Bytes> {
        Err(GatewayError::NotFound(id.to_string()))
    }

    async fn ping(&self) -> Result<bool> {
        Ok(true)
    }
}

fn in_process(store: Arc<dyn ContentStore>) -> Gateway {
    let rpc = RpcClient::new(Endpoint::rpc("http://node.test").unwrap(), Arc::new(StubNode)).unwrap();
    Gateway::new(rpc, store)
}

// ============================================================================
// In-process Tests
// ============================================================================

#[tokio::test]
async fn test_call_and_put_all_succeeded() {
    let gateway = in_process(Arc::new(MemoryStore::new()));

    let outcome = gateway
        .call_and_put(
            &[("eth_blockNumber", vec![]), ("eth_gasPrice", vec![])],
            vec![Bytes::from_static(b"Hello, IPFS!")],
        )
        .await;

    assert_eq!(outcome.status(), OverallStatus::AllSucceeded);
    assert_eq!(
        outcome.into_results(),
        vec![
            Ok(GatewayValue::Json(json!("0x10"))),
            Ok(GatewayValue::Json(json!("0x3b9aca00"))),
            Ok(GatewayValue::Content(ContentId::sha256_v0(b"Hello, IPFS!"))),
        ]
    );
}

#[tokio::test]
async fn test_store_failure_isolated() {
    let gateway = in_process(Arc::new(FullStore));

    let outcome = gateway
        .call_and_put(&[("eth_blockNumber", vec![])], vec![Bytes::from_static(b"x")])
        .await;

    assert_eq!(outcome.status(), OverallStatus::PartialFailure);
    let failures: Vec<_> = outcome.failures().collect();
    assert_eq!(
        failures,
        vec![(1, &GatewayError::StoreRejected("disk full".into()))]
    );
}

#[tokio::test]
async fn test_put_many_get_many_round_trip() {
    let gateway = in_process(Arc::new(MemoryStore::new()));
    let contents: Vec<Bytes> = (0..5).map(|i| Bytes::from(format!("block {i}"))).collect();

    let stored = gateway.put_many(contents.clone()).await;
    assert!(stored.is_success());
    let ids: Vec<ContentId> = stored.into_results().into_iter().map(|r| r.unwrap()).collect();

    let missing = ContentId::sha256_v0(b"missing");
    let mut wanted = ids.clone();
    wanted.push(missing.clone());

    let fetched = gateway.get_many(&wanted).await;
    assert_eq!(fetched.status(), OverallStatus::PartialFailure);

    let results = fetched.into_results();
    for (i, content) in contents.iter().enumerate() {
        assert_eq!(results[i].as_ref().unwrap(), content);
    }
    assert_eq!(results[5], Err(GatewayError::NotFound(missing.to_string())));
}

#[tokio::test]
async fn test_empty_fan_out() {
    let gateway = in_process(Arc::new(MemoryStore::new()));
    let none: &[(&str, Vec<serde_json::Value>)] = &[];

    let outcome = gateway.call_and_put(none, Vec::new()).await;

    assert!(outcome.is_empty());
    assert_eq!(outcome.status(), OverallStatus::AllSucceeded);
}

#[tokio::test]
async fn test_shutdown() {
    let gateway = in_process(Arc::new(MemoryStore::new()));
    gateway.shutdown();

    let outcome = gateway
        .call_and_put(&[("eth_blockNumber", vec![])], vec![Bytes::from_static(b"still stored")])
        .await;

    let results = outcome.into_results();
    assert_eq!(results[0], Err(GatewayError::Shutdown));
    assert!(results[1].is_ok());
}

// ============================================================================
// Configured Gateway Tests
// ============================================================================

/// Stub serving JSON-RPC on `/rpc` and the storage API on `/api/v0/*`.
async fn start_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                continue;
            };
            tokio::spawn(async move {
                let service = service_fn(|req: Request<Incoming>| async move {
                    let path = req.uri().path().to_string();
                    let body = req.into_body().collect().await?.to_bytes();
                    let reply = match path.as_str() {
                        "/rpc" => {
                            let req: IncomingRequest = serde_json::from_slice(&body).unwrap();
                            serde_json::to_vec(&node_answer(req)).unwrap()
                        }
                        "/api/v0/add" => {
                            let id = ContentId::sha256_v0(&body);
                            json!({"Name": "blob", "Hash": id.as_str(), "Size": "1"})
                                .to_string()
                                .into_bytes()
                        }
                        "/api/v0/id" => json!({"ID": "12D3KooWStub"}).to_string().into_bytes(),
                        _ => {
                            return Ok::<_, hyper::Error>(
                                Response::builder()
                                    .status(StatusCode::NOT_FOUND)
                                    .body(Full::new(Bytes::new()))
                                    .unwrap(),
                            )
                        }
                    };
                    Ok(Response::new(Full::new(Bytes::from(reply))))
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_gateway_from_config_file() {
    let base = start_backend().await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    let config = json!({
        "rpc": {"address": format!("{base}/rpc"), "timeoutMs": 2000},
        "store": {"address": base, "maxRetries": 0},
        "pool": {"maxIdlePerHost": 2}
    });
    write!(file, "{}", config).unwrap();

    let config = GatewayConfig::load(file.path()).unwrap();
    let gateway = Gateway::from_config(&config).unwrap();

    assert!(gateway.ping().await.unwrap());

    let outcome = gateway
        .call_and_put(&[("eth_blockNumber", vec![])], vec![Bytes::from_static(b"Hello, IPFS!")])
        .await;

    assert!(outcome.is_success(), "{:?}", outcome);
    let results = outcome.into_results();
    assert_eq!(results[0], Ok(GatewayValue::Json(json!("0x10"))));
    assert!(matches!(results[1], Ok(GatewayValue::Content(_))));
}

#[test]
fn test_invalid_config_rejected() {
    let config = GatewayConfig::from_json(
        r#"{"rpc": {"address": "127.0.0.1:8545"}, "store": {"address": "http://127.0.0.1:5001"}}"#,
    )
    .unwrap();

    let err = Gateway::from_config(&config).err().unwrap();
    assert!(matches!(err, GatewayError::InvalidConfig(_)));
}
