//! JSON-RPC 2.0 wire envelopes.
//!
//! - Request: `{"jsonrpc": "2.0", "method": "...", "params": [...], "id": 1}`
//! - Response: `{"jsonrpc": "2.0", "result": ..., "id": 1}` or
//!   `{"jsonrpc": "2.0", "error": {"code": ..., "message": "..."}, "id": 1}`
//!
//! These are the raw, unvalidated shapes. [`RpcCodec`](crate::transport::RpcCodec)
//! turns a [`JsonRpcResponse`] into a validated
//! [`RpcResponse`](crate::protocol::RpcResponse).
//!
//! # Error Codes
//!
//! - `-32700`: Parse error
//! - `-32600`: Invalid request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//! - `-32000` to `-32099`: Server error

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::RequestId;

pub const JSONRPC_VERSION: &str = "2.0";

/// Outgoing request envelope.
///
/// Borrows its method and params so encoding a call never clones the
/// parameter list. Field order here is the field order on the wire.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: &'a [Value],
    pub id: RequestId,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(method: &'a str, params: &'a [Value], id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id,
        }
    }
}

/// Owned request envelope, as seen by a server.
///
/// Only stub nodes need this; enable the `testutil` feature to get it.
#[cfg(any(test, feature = "testutil"))]
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IncomingRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

/// Response envelope.
///
/// `result` distinguishes an absent member (`None`) from an explicit
/// `null` result (`Some(Value::Null)`), which is a legitimate answer for
/// many eth methods.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(default)]
    pub id: Value,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Invalid JSON was received by the server
pub const PARSE_ERROR: i64 = -32700;
/// The JSON sent is not a valid Request object
pub const INVALID_REQUEST: i64 = -32600;
/// The method does not exist / is not available
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameter(s)
pub const INVALID_PARAMS: i64 = -32602;

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Server-side constructors, for stub nodes.
#[cfg(any(test, feature = "testutil"))]
impl JsonRpcError {
    pub fn invalid_request() -> Self {
        Self::new(INVALID_REQUEST, "Invalid Request")
    }

    pub fn method_not_found() -> Self {
        Self::new(METHOD_NOT_FOUND, "Method not found")
    }

    pub fn invalid_params(msg: &str) -> Self {
        Self::new(INVALID_PARAMS, msg)
    }
}

#[cfg(any(test, feature = "testutil"))]
impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            result: None,
            error: Some(error),
            id,
        }
    }
}
