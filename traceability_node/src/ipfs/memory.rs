//! In-memory metadata store for demos and tests.
//!
//! Content-addressed like the real thing: the hash is derived from the
//! canonical JSON bytes, so identical documents pin to identical hashes.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{EventMetadata, IpfsError, IpfsResult, MetadataStore, PinReceipt};

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// CIDv0-shaped hash over the canonical document bytes.
    fn content_hash(bytes: &[u8]) -> String {
        let digest = Sha256::digest(bytes);
        format!("Qm{}", &hex::encode(digest)[..44])
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn upload_json(&self, metadata: &EventMetadata, _name: &str) -> IpfsResult<PinReceipt> {
        let value = serde_json::to_value(metadata)?;
        let bytes = serde_json::to_vec(&value)?;
        let ipfs_hash = Self::content_hash(&bytes);

        let mut documents = self.documents.write().await;
        documents.insert(ipfs_hash.clone(), value);

        Ok(PinReceipt {
            gateway_url: format!("memory://{}", ipfs_hash),
            ipfs_hash,
        })
    }

    async fn fetch(&self, ipfs_hash: &str) -> IpfsResult<EventMetadata> {
        let documents = self.documents.read().await;
        let value = documents
            .get(ipfs_hash)
            .cloned()
            .ok_or_else(|| IpfsError::NotFound(ipfs_hash.to_string()))?;
        Ok(serde_json::from_value(value)?)
    }
}
