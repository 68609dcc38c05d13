//! Off-chain metadata storage behind one interface.
//!
//! Events carry only a content hash; the document lives in a
//! content-addressed store. [`MetadataStore`] abstracts over the Pinata
//! pinning service and the in-memory demo store; selection happens in
//! configuration, and callers never learn which backend answered.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;
pub mod metadata;
pub mod pinata;

pub use memory::MemoryStore;
pub use metadata::EventMetadata;
pub use pinata::PinataStore;

pub type IpfsResult<T> = std::result::Result<T, IpfsError>;

#[derive(Debug, Error)]
pub enum IpfsError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("pinning service rejected request: {0}")]
    Rejected(String),
    #[error("no document pinned under {0}")]
    NotFound(String),
    #[error("document is not valid event metadata: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result of pinning one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinReceipt {
    pub ipfs_hash: String,
    /// Public URL the document can be fetched from.
    pub gateway_url: String,
}

/// Content-addressed store for event metadata documents.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Pin a document and return its content hash.
    async fn upload_json(&self, metadata: &EventMetadata, name: &str) -> IpfsResult<PinReceipt>;

    /// Fetch and decode the document behind a content hash.
    async fn fetch(&self, ipfs_hash: &str) -> IpfsResult<EventMetadata>;
}
