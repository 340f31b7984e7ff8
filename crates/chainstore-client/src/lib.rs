//! Chainstore RPC Client
//!
//! JSON-RPC 2.0 client for blockchain node endpoints. A [`RpcClient`] is
//! bound to one endpoint and offers three ways to call it:
//!
//! - [`call`](RpcClient::call): one request, one result
//! - [`call_many`](RpcClient::call_many): concurrent fan-out, one task and
//!   one deadline per call, results in input order
//! - [`call_batch`](RpcClient::call_batch): one JSON-RPC batch request,
//!   answers routed back by id
//!
//! Every in-flight call owns a fresh correlation id registered in the
//! client's outstanding-call table until it completes, times out, is
//! dropped, or the client shuts down.

mod client;
mod outstanding;

pub use client::RpcClient;
