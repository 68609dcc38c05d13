//! Chain backends behind one interface.
//!
//! The node never talks to a ledger directly from business logic; it
//! goes through [`ChainClient`], and the concrete backend is chosen by
//! configuration. `memory` keeps the whole registry in process (demo
//! and test mode), `gateway` delegates to a remote node over HTTP.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Batch, Event, EventType, Location};

pub mod gateway;
pub mod memory;

pub use gateway::GatewayChain;
pub use memory::MemoryChain;

pub type ChainResult<T> = std::result::Result<T, ChainError>;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("batch not found: {0}")]
    BatchNotFound(String),
    #[error("batch already exists: {0}")]
    BatchExists(String),
    #[error("duplicate event id: {0}")]
    DuplicateEvent(String),
    #[error("parent event not found: {0}")]
    ParentNotFound(String),
    #[error("{0} events cannot be appended to an existing batch")]
    InvalidEventKind(EventType),
    #[error("gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("gateway rejected request: {0}")]
    Gateway(String),
    #[error("backend returned malformed data: {0}")]
    InvalidResponse(String),
}

/// Confirmation returned by a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainReceipt {
    pub transaction_hash: String,
    pub block_number: u64,
}

/// Payload for registering a new batch with its root collection event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchRequest {
    pub batch_id: String,
    pub herb_species: String,
    pub collection_event_id: String,
    pub ipfs_hash: String,
    pub location: Location,
    #[serde(default)]
    pub qr_code_hash: String,
}

/// Payload for appending a non-root event to an existing batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEventRequest {
    pub batch_id: String,
    pub event_id: String,
    #[serde(default)]
    pub parent_event_id: String,
    pub ipfs_hash: String,
    pub location: Location,
    #[serde(default)]
    pub qr_code_hash: String,
}

/// Uniform surface over every ledger variant: create a batch, append an
/// event of a given kind, and read batches and their event logs back.
///
/// Implementations own all connection and signing concerns; callers
/// supply data and a participant address, never keys.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Register a batch and write its root collection event.
    async fn create_batch(
        &self,
        participant: &str,
        request: CreateBatchRequest,
    ) -> ChainResult<ChainReceipt>;

    /// Append a quality-test, processing, or manufacturing event.
    /// `Collection` is not a valid kind here; roots only enter through
    /// [`ChainClient::create_batch`].
    async fn add_event(
        &self,
        participant: &str,
        kind: EventType,
        request: AddEventRequest,
    ) -> ChainResult<ChainReceipt>;

    /// Complete event snapshot for one batch, unordered.
    async fn get_batch_events(&self, batch_id: &str) -> ChainResult<Vec<Event>>;

    /// Every registered batch with its denormalized info.
    async fn get_all_batches(&self) -> ChainResult<Vec<Batch>>;
}
