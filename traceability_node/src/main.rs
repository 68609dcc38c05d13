use anyhow::Result;
use log::info;
use std::sync::Arc;

use herbionyx_node::api::{ApiServer, AppState};
use herbionyx_node::chain::{ChainClient, GatewayChain, MemoryChain};
use herbionyx_node::config::{AppConfig, ChainBackend, IpfsBackend};
use herbionyx_node::identity::{IdentityResolver, InMemoryDirectory};
use herbionyx_node::ipfs::{MemoryStore, MetadataStore, PinataStore};
use herbionyx_node::tracking::TrackingService;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let config = AppConfig::from_env();

    let chain: Arc<dyn ChainClient> = match config.chain.backend {
        ChainBackend::Memory => Arc::new(MemoryChain::new()),
        ChainBackend::Gateway => Arc::new(GatewayChain::new(&config.chain.gateway)),
    };
    let metadata: Arc<dyn MetadataStore> = match config.ipfs.backend {
        IpfsBackend::Memory => Arc::new(MemoryStore::new()),
        IpfsBackend::Pinata => Arc::new(PinataStore::new(&config.ipfs.pinata)),
    };
    // Demo mode ships a pre-seeded directory; against a real network the
    // directory comes from the registration flow instead.
    let identity: Arc<dyn IdentityResolver> = if config.chain.backend == ChainBackend::Memory {
        Arc::new(InMemoryDirectory::with_demo_participants().await)
    } else {
        Arc::new(InMemoryDirectory::new())
    };

    let backend_label = match config.chain.backend {
        ChainBackend::Memory => "memory",
        ChainBackend::Gateway => "gateway",
    };
    info!(
        "starting traceability node (chain backend: {})",
        backend_label
    );

    let state = AppState {
        tracking: Arc::new(TrackingService::new(
            chain.clone(),
            metadata.clone(),
            identity,
        )),
        chain,
        metadata,
        chain_backend: backend_label.to_string(),
    };

    ApiServer::new(config.api.port, state).run().await
}
