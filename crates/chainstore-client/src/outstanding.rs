//! Outstanding-call table.
//!
//! Maps each in-flight correlation id to its deadline and the one-shot slot
//! its caller is waiting on. Entries are only touched in synchronous
//! sections, so no lock is ever held across an `.await`.

use chainstore_common::protocol::{GatewayError, RequestId, Result, RpcResponse};
use chainstore_common::IdSequence;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;

struct Slot {
    method: String,
    deadline: Instant,
    sender: Option<oneshot::Sender<Result<Value>>>,
}

#[derive(Default)]
pub(crate) struct OutstandingCalls {
    calls: DashMap<RequestId, Slot>,
}

impl OutstandingCalls {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reserves a fresh id for `method`.
    ///
    /// Ids still outstanding (possible only after the sequence wraps) are
    /// skipped.
    pub(crate) fn register(&self, ids: &IdSequence, method: &str, deadline: Instant) -> PendingCall<'_> {
        let (sender, receiver) = oneshot::channel();
        let mut sender = Some(sender);
        loop {
            let id = ids.next_id();
            if let Entry::Vacant(vacant) = self.calls.entry(id) {
                vacant.insert(Slot {
                    method: method.to_string(),
                    deadline,
                    sender: sender.take(),
                });
                return PendingCall {
                    table: self,
                    id,
                    deadline,
                    receiver,
                };
            }
        }
    }

    /// Routes a response into the slot registered under its id.
    ///
    /// Returns `false` (and logs) when no caller is waiting for that id:
    /// the id was never issued, already answered, or already released.
    pub(crate) fn deliver(&self, response: RpcResponse) -> bool {
        let id = response.id;
        self.resolve(id, response.into_result())
    }

    pub(crate) fn fail(&self, id: RequestId, error: GatewayError) -> bool {
        self.resolve(id, Err(error))
    }

    fn resolve(&self, id: RequestId, result: Result<Value>) -> bool {
        let sender = self.calls.get_mut(&id).and_then(|mut slot| slot.sender.take());
        match sender {
            Some(sender) => {
                // The receiver may already be gone if the caller gave up.
                let _ = sender.send(result);
                true
            }
            None => {
                tracing::warn!(id, "Discarding response for unknown or completed call");
                false
            }
        }
    }

    /// Fails every waiting call with `error`. Returns how many were woken.
    pub(crate) fn cancel_all(&self, error: GatewayError) -> usize {
        let mut cancelled = 0;
        for mut slot in self.calls.iter_mut() {
            if let Some(sender) = slot.sender.take() {
                tracing::debug!(id = *slot.key(), method = %slot.method, "Cancelling outstanding call");
                let _ = sender.send(Err(error.clone()));
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Calls whose deadline has passed but which are still registered.
    pub(crate) fn overdue(&self, now: Instant) -> usize {
        self.calls.iter().filter(|slot| slot.deadline <= now).count()
    }

    pub(crate) fn len(&self) -> usize {
        self.calls.len()
    }
}

/// A registered call. Dropping it releases the id.
pub(crate) struct PendingCall<'a> {
    table: &'a OutstandingCalls,
    id: RequestId,
    deadline: Instant,
    receiver: oneshot::Receiver<Result<Value>>,
}

impl PendingCall<'_> {
    pub(crate) fn id(&self) -> RequestId {
        self.id
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Waits for the slot to be filled.
    pub(crate) async fn recv(&mut self) -> Result<Value> {
        (&mut self.receiver).await.unwrap_or(Err(GatewayError::Shutdown))
    }

    /// Takes the result if the slot has already been filled.
    pub(crate) fn try_recv(&mut self) -> Option<Result<Value>> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        self.table.calls.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainstore_common::protocol::RpcOutcome;
    use serde_json::json;
    use std::time::Duration;

    fn later() -> Instant {
        Instant::now() + Duration::from_secs(10)
    }

    #[tokio::test]
    async fn test_deliver_and_release() {
        let table = OutstandingCalls::new();
        let ids = IdSequence::new();

        let mut pending = table.register(&ids, "eth_blockNumber", later());
        assert_eq!(table.len(), 1);

        let id = pending.id();
        assert!(table.deliver(RpcResponse::new(id, RpcOutcome::Result(json!("0x10")))));
        assert_eq!(pending.recv().await, Ok(json!("0x10")));

        // A second answer for the same id has nowhere to go.
        assert!(!table.deliver(RpcResponse::new(id, RpcOutcome::Result(json!("0x11")))));

        drop(pending);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_unknown_id_discarded() {
        let table = OutstandingCalls::new();
        assert!(!table.deliver(RpcResponse::new(99, RpcOutcome::Result(json!(1)))));
    }

    #[test]
    fn test_register_skips_outstanding_ids() {
        let table = OutstandingCalls::new();
        let ids = IdSequence::starting_at(5);
        let first = table.register(&ids, "a", later());
        assert_eq!(first.id(), 5);

        // Rewind the sequence so the next id collides with `first`.
        let rewound = IdSequence::starting_at(5);
        let second = table.register(&rewound, "b", later());
        assert_eq!(second.id(), 6);
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let table = OutstandingCalls::new();
        let ids = IdSequence::new();
        let mut a = table.register(&ids, "a", later());
        let mut b = table.register(&ids, "b", later());

        assert_eq!(table.cancel_all(GatewayError::Shutdown), 2);
        assert_eq!(a.recv().await, Err(GatewayError::Shutdown));
        assert_eq!(b.recv().await, Err(GatewayError::Shutdown));
        assert_eq!(table.cancel_all(GatewayError::Shutdown), 0);
    }

    #[tokio::test]
    async fn test_fail_and_try_recv() {
        let table = OutstandingCalls::new();
        let ids = IdSequence::new();
        let mut pending = table.register(&ids, "eth_call", later());

        assert!(pending.try_recv().is_none());
        assert!(table.fail(pending.id(), GatewayError::Timeout(5)));
        assert_eq!(pending.try_recv(), Some(Err(GatewayError::Timeout(5))));
    }

    #[test]
    fn test_overdue() {
        let table = OutstandingCalls::new();
        let ids = IdSequence::new();
        let now = Instant::now();
        let _past = table.register(&ids, "a", now);
        let _future = table.register(&ids, "b", now + Duration::from_secs(1));
        assert_eq!(table.overdue(now), 1);
    }
}
