use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

pub type RequestId = u64;
pub type MethodName = String;
pub type RpcParams = Vec<Value>;

/// A single logical call: method name, ordered params, correlation id.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub id: RequestId,
    pub method: MethodName,
    pub params: RpcParams,
}

impl RpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: RpcParams) -> Self {
        RpcRequest {
            id,
            method: method.into(),
            params,
        }
    }
}

/// Monotonic correlation id source owned by one client.
///
/// Ids start at 1 and wrap after `u64::MAX`; callers that must avoid
/// colliding with still-outstanding ids check the candidate against their
/// own table (see the outstanding-call table in `chainstore-client`).
#[derive(Debug)]
pub struct IdSequence {
    next: AtomicU64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: RequestId) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> RequestId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}
