use async_trait::async_trait;
use bytes::Bytes;
use chainstore_common::protocol::{ContentId, GatewayError, Result};
use dashmap::DashMap;

use crate::store::ContentStore;

/// In-process content store.
///
/// Ids are the CIDv0 of the bytes hashed as one raw block. A daemon wraps
/// content in UnixFS before hashing, so it reports different ids for the
/// same bytes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blocks: DashMap<ContentId, Bytes>,
}

impl MemoryStore {
    /// Creates a new, empty `MemoryStore`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &ContentId) -> bool {
        self.blocks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn put(&self, data: Bytes) -> Result<ContentId> {
        let id = ContentId::sha256_v0(&data);
        self.blocks.entry(id.clone()).or_insert(data);
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> Result<Bytes> {
        self.blocks
            .get(id)
            .map(|block| block.value().clone())
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }

    async fn ping(&self) -> Result<bool> {
        Ok(true)
    }
}
