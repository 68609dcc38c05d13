//! Pinata-backed metadata store.
//!
//! Documents are pinned through `pinJSONToIPFS` and read back through
//! the public gateway. Credentials travel in the `pinata_api_key` /
//! `pinata_secret_api_key` headers the service expects.

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{EventMetadata, IpfsError, IpfsResult, MetadataStore, PinReceipt};
use crate::config::PinataConfig;

pub struct PinataStore {
    http: reqwest::Client,
    api_url: String,
    gateway_url: String,
    api_key: String,
    secret_api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PinRequest<'a> {
    pinata_content: &'a EventMetadata,
    pinata_metadata: PinMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct PinMetadata<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl PinataStore {
    pub fn new(config: &PinataConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            secret_api_key: config.secret_api_key.clone(),
        }
    }

    fn gateway_path(&self, ipfs_hash: &str) -> String {
        format!("{}/ipfs/{}", self.gateway_url, ipfs_hash)
    }
}

#[async_trait]
impl MetadataStore for PinataStore {
    async fn upload_json(&self, metadata: &EventMetadata, name: &str) -> IpfsResult<PinReceipt> {
        debug!("pinning {} to ipfs", name);
        let response = self
            .http
            .post(format!("{}/pinning/pinJSONToIPFS", self.api_url))
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_api_key)
            .json(&PinRequest {
                pinata_content: metadata,
                pinata_metadata: PinMetadata { name },
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IpfsError::Rejected(format!("{}: {}", status, body)));
        }

        let pinned: PinResponse = response.json().await?;
        Ok(PinReceipt {
            gateway_url: self.gateway_path(&pinned.ipfs_hash),
            ipfs_hash: pinned.ipfs_hash,
        })
    }

    async fn fetch(&self, ipfs_hash: &str) -> IpfsResult<EventMetadata> {
        let response = self.http.get(self.gateway_path(ipfs_hash)).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(IpfsError::NotFound(ipfs_hash.to_string()));
        }
        let status = response.status();
        if !status.is_success() {
            return Err(IpfsError::Rejected(format!("gateway returned {}", status)));
        }
        let value: serde_json::Value = response.json().await?;
        Ok(serde_json::from_value(value)?)
    }
}
