//! Chainstore Content Store
//!
//! Content-addressed storage behind the [`ContentStore`] trait:
//!
//! - [`StoreClient`]: talks to a storage daemon over its HTTP API
//!   (`/api/v0/add`, `/api/v0/cat`, `/api/v0/id`)
//! - [`MemoryStore`]: in-process store for embedding and tests
//!
//! Stored content is addressed by [`ContentId`](chainstore_common::ContentId);
//! putting identical bytes twice yields the same id.

mod client;
mod memory;
pub mod multipart;
mod store;

pub use client::StoreClient;
pub use memory::MemoryStore;
pub use store::ContentStore;
