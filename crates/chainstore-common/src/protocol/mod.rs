pub mod content_id;
pub mod error;
pub mod jsonrpc;
pub mod requests;
pub mod responses;


pub use content_id::{ContentId, IdEncoding};
pub use error::{GatewayError, Result};
#[cfg(any(test, feature = "testutil"))]
pub use jsonrpc::IncomingRequest;
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use requests::{IdSequence, MethodName, RequestId, RpcParams, RpcRequest};
pub use responses::{RpcOutcome, RpcResponse};
