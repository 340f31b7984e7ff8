//! Chainstore Common Types and Transport
//!
//! This crate provides the protocol definitions, transport layer and
//! configuration shared by the chainstore RPC and content-store clients.
//!
//! # Overview
//!
//! Chainstore is a client core for blockchain gateways: it issues JSON-RPC
//! calls to a node endpoint and stores or retrieves content-addressed data
//! on a storage daemon, singly or as concurrent fan-outs. This crate holds
//! everything both sides share:
//!
//! - **Protocol Layer**: JSON-RPC envelopes, content ids, the error taxonomy
//! - **Transport Layer**: the [`Transport`](transport::Transport) trait, the
//!   pooled HTTP(S) transport, the RPC codec and the retry policy
//! - **Configuration**: endpoints, credentials and pool settings
//! - **Aggregation**: ordered fan-out results with an overall status
//!
//! # Wire Format
//!
//! - **RPC**: JSON-RPC 2.0 over HTTP POST, `id` echo mandatory
//! - **Store**: the storage daemon's HTTP API (`/api/v0/add`, `cat`, `id`)
//! - **Max Response Size**: 100 MB
//!
//! # Example
//!
//! ```
//! use chainstore_common::transport::RpcCodec;
//! use chainstore_common::{ContentId, GatewayError};
//!
//! let body = RpcCodec::encode("eth_blockNumber", &[], 1).unwrap();
//! assert!(body.starts_with(br#"{"jsonrpc":"2.0""#));
//!
//! let err = ContentId::parse("not-an-id").unwrap_err();
//! assert!(matches!(err, GatewayError::InvalidContentId(_)));
//! ```

pub mod auth;
pub mod config;
pub mod outcome;
pub mod protocol;
pub mod transport;

pub use auth::Credential;
pub use config::{Endpoint, EndpointConfig, EndpointKind, GatewayConfig, PoolConfig};
pub use outcome::{AggregatedOutcome, GatewayValue, OverallStatus};
pub use protocol::*;
