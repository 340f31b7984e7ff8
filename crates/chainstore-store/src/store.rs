use async_trait::async_trait;
use bytes::Bytes;
use chainstore_common::protocol::{ContentId, Result};

/// Content-addressed storage.
///
/// Storing identical bytes twice yields the same [`ContentId`], and a
/// successful `get` returns exactly the bytes that were stored under it.
#[async_trait]
pub trait ContentStore: std::fmt::Debug + Send + Sync + 'static {
    /// Stores `data` and returns its content-derived identifier.
    async fn put(&self, data: Bytes) -> Result<ContentId>;

    /// Retrieves the complete content stored under `id`.
    ///
    /// Never returns a partial body: truncated transfers fail with
    /// `MalformedResponse`, unknown ids with `NotFound`.
    async fn get(&self, id: &ContentId) -> Result<Bytes>;

    /// Health check. `Ok(true)` when the store answers with an identity.
    async fn ping(&self) -> Result<bool>;
}
