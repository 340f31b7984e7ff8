//! Validated RPC responses.
//!
//! An [`RpcResponse`] only exists once the codec has checked the envelope:
//! the version is `"2.0"`, the `id` is an integer, and exactly one of
//! `result` / `error` is present.

use serde_json::Value;

use super::error::{GatewayError, Result};
use super::jsonrpc::JsonRpcError;
use super::RequestId;

/// What the remote side answered.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcOutcome {
    Result(Value),
    Error(JsonRpcError),
}

/// A response matched to a correlation id.
///
/// # Example
///
/// ```
/// use chainstore_common::protocol::{RpcOutcome, RpcResponse};
/// use serde_json::json;
///
/// let response = RpcResponse::new(4, RpcOutcome::Result(json!("0x10")));
/// assert_eq!(response.into_result().unwrap(), json!("0x10"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RpcResponse {
    pub id: RequestId,
    pub outcome: RpcOutcome,
}

impl RpcResponse {
    pub fn new(id: RequestId, outcome: RpcOutcome) -> Self {
        Self { id, outcome }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, RpcOutcome::Error(_))
    }

    /// Converts the remote outcome into the caller-facing result.
    ///
    /// A remote error object becomes [`GatewayError::Protocol`].
    pub fn into_result(self) -> Result<Value> {
        match self.outcome {
            RpcOutcome::Result(value) => Ok(value),
            RpcOutcome::Error(err) => Err(GatewayError::Protocol {
                code: err.code,
                message: err.message,
            }),
        }
    }
}
