//! Node configuration.
//!
//! Everything is an explicit value object built once at startup and
//! passed into the component that needs it; no module holds ambient
//! connection state. Backend selection for the chain and the metadata
//! store happens here and nowhere else.

use log::warn;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 5000 }
    }
}

/// Which ledger variant the node writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainBackend {
    /// Process-local registry; demo and test mode.
    Memory,
    /// Delegate to a remote node over HTTP.
    Gateway,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Bearer token forwarded to the remote node, when it requires one.
    pub api_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            api_token: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainConfig {
    pub backend: ChainBackend,
    pub gateway: GatewayConfig,
}

impl Default for ChainBackend {
    fn default() -> Self {
        ChainBackend::Memory
    }
}

/// Which metadata store pins event documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpfsBackend {
    Memory,
    Pinata,
}

impl Default for IpfsBackend {
    fn default() -> Self {
        IpfsBackend::Memory
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinataConfig {
    pub api_url: String,
    pub gateway_url: String,
    pub api_key: String,
    pub secret_api_key: String,
}

impl Default for PinataConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.pinata.cloud".to_string(),
            gateway_url: "https://gateway.pinata.cloud".to_string(),
            api_key: String::new(),
            secret_api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IpfsConfig {
    pub backend: IpfsBackend,
    pub pinata: PinataConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub chain: ChainConfig,
    pub ipfs: IpfsConfig,
}

impl AppConfig {
    /// Build the configuration from environment variables, falling back
    /// to demo defaults (in-memory chain and metadata store).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(port) = env::var("PORT") {
            match port.parse() {
                Ok(port) => config.api.port = port,
                Err(_) => warn!("ignoring unparseable PORT value: {}", port),
            }
        }

        if let Ok(backend) = env::var("CHAIN_BACKEND") {
            match backend.to_lowercase().as_str() {
                "memory" => config.chain.backend = ChainBackend::Memory,
                "gateway" => config.chain.backend = ChainBackend::Gateway,
                other => warn!("unknown CHAIN_BACKEND {:?}, keeping memory", other),
            }
        }
        if let Ok(url) = env::var("CHAIN_GATEWAY_URL") {
            config.chain.gateway.base_url = url;
        }
        if let Ok(token) = env::var("CHAIN_GATEWAY_TOKEN") {
            config.chain.gateway.api_token = Some(token);
        }

        if let Ok(backend) = env::var("IPFS_BACKEND") {
            match backend.to_lowercase().as_str() {
                "memory" => config.ipfs.backend = IpfsBackend::Memory,
                "pinata" => config.ipfs.backend = IpfsBackend::Pinata,
                other => warn!("unknown IPFS_BACKEND {:?}, keeping memory", other),
            }
        }
        if let Ok(key) = env::var("PINATA_API_KEY") {
            config.ipfs.pinata.api_key = key;
        }
        if let Ok(secret) = env::var("PINATA_SECRET_API_KEY") {
            config.ipfs.pinata.secret_api_key = secret;
        }

        config
    }
}
