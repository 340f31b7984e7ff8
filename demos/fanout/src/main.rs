//! # Fan-out demo
//!
//! Reads a gateway configuration, then issues a few JSON-RPC calls and
//! stores a payload in one concurrent fan-out, printing each entry's
//! outcome.
//!
//! ```bash
//! fanout gateway.json
//! fanout gateway.json --message "Hello, IPFS!" --memory-store
//! RUST_LOG=debug fanout gateway.json
//! ```
//!
//! `gateway.json`:
//!
//! ```json
//! {
//!   "rpc":   { "address": "http://127.0.0.1:8545" },
//!   "store": { "address": "http://127.0.0.1:5001" }
//! }
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use argh::FromArgs;
use bytes::Bytes;
use chainstore::{Gateway, GatewayConfig, GatewayValue, MemoryStore, OverallStatus, RpcClient};

/// Run RPC calls and a content upload as one fan-out.
#[derive(FromArgs)]
struct Args {
    /// path to the gateway configuration (JSON)
    #[argh(positional)]
    config: String,

    /// payload to store
    #[argh(option, short = 'm', default = "String::from(\"Hello, IPFS!\")")]
    message: String,

    /// keep content in memory instead of the configured daemon
    #[argh(switch)]
    memory_store: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();

    // Set default log level to INFO, but allow RUST_LOG env var to override
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = GatewayConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config))?;

    let gateway = if args.memory_store {
        let rpc = RpcClient::from_config(&config.rpc, &config.pool)?;
        Gateway::new(rpc, Arc::new(MemoryStore::new()))
    } else {
        Gateway::from_config(&config)?
    };

    match gateway.ping().await {
        Ok(true) => tracing::info!("Store is up"),
        Ok(false) => tracing::warn!("Store answered without an identity"),
        Err(e) => tracing::warn!(error = %e, "Store ping failed"),
    }

    let calls = [("eth_blockNumber", vec![]), ("eth_gasPrice", vec![])];
    let outcome = gateway
        .call_and_put(&calls, vec![Bytes::from(args.message.clone())])
        .await;

    let mut stored = Vec::new();
    for (i, result) in outcome.results().iter().enumerate() {
        match result {
            Ok(GatewayValue::Json(value)) => println!("[{i}] {} = {value}", calls[i].0),
            Ok(GatewayValue::Content(id)) => {
                println!("[{i}] stored {id}");
                stored.push(id.clone());
            }
            Ok(GatewayValue::Bytes(bytes)) => println!("[{i}] {} bytes", bytes.len()),
            Err(e) => println!("[{i}] failed: {e}"),
        }
    }

    let fetched = gateway.get_many(&stored).await;
    for (id, result) in stored.iter().zip(fetched.into_results()) {
        match result {
            Ok(bytes) => println!("{id} -> {}", String::from_utf8_lossy(&bytes)),
            Err(e) => println!("{id} -> failed: {e}"),
        }
    }

    gateway.shutdown();

    match outcome.status() {
        OverallStatus::AllSucceeded => Ok(()),
        status => anyhow::bail!("fan-out finished with {:?}", status),
    }
}
