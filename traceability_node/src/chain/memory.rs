//! In-memory chain backend.
//!
//! Mirrors the batch-registry contract semantics closely enough for
//! demos and tests: batch ids are unique, event ids are unique within a
//! batch, and writes are append-only. Receipts carry a fabricated
//! transaction hash derived from the write payload and a monotonically
//! increasing block number.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use super::{
    AddEventRequest, ChainClient, ChainError, ChainReceipt, ChainResult, CreateBatchRequest,
};
use crate::types::{Batch, Event, EventType};

#[derive(Debug, Default)]
struct BatchRecord {
    herb_species: String,
    creation_time: u64,
    events: Vec<Event>,
}

#[derive(Debug, Default)]
struct Registry {
    batches: HashMap<String, BatchRecord>,
    /// Insertion order, so listings are stable.
    order: Vec<String>,
    block_height: u64,
}

/// Process-local ledger. Cloneable handles share one registry.
#[derive(Debug, Default)]
pub struct MemoryChain {
    registry: RwLock<Registry>,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn receipt(registry: &mut Registry, payload: &str) -> ChainReceipt {
        registry.block_height += 1;
        let digest = Sha256::digest(format!("{}|{}", payload, registry.block_height).as_bytes());
        ChainReceipt {
            transaction_hash: format!("0x{}", hex::encode(digest)),
            block_number: registry.block_height,
        }
    }
}

#[async_trait]
impl ChainClient for MemoryChain {
    async fn create_batch(
        &self,
        participant: &str,
        request: CreateBatchRequest,
    ) -> ChainResult<ChainReceipt> {
        let mut registry = self.registry.write().await;
        if registry.batches.contains_key(&request.batch_id) {
            return Err(ChainError::BatchExists(request.batch_id));
        }

        let timestamp = Self::now();
        let root = Event {
            event_id: request.collection_event_id,
            event_type: EventType::Collection,
            participant: participant.to_string(),
            ipfs_hash: request.ipfs_hash,
            location: request.location,
            timestamp,
            parent_event_id: String::new(),
            qr_code_hash: request.qr_code_hash,
        };

        let receipt = Self::receipt(&mut registry, &format!("{}|{}", request.batch_id, root.event_id));
        registry.batches.insert(
            request.batch_id.clone(),
            BatchRecord {
                herb_species: request.herb_species,
                creation_time: timestamp,
                events: vec![root],
            },
        );
        registry.order.push(request.batch_id);
        Ok(receipt)
    }

    async fn add_event(
        &self,
        participant: &str,
        kind: EventType,
        request: AddEventRequest,
    ) -> ChainResult<ChainReceipt> {
        if kind == EventType::Collection {
            return Err(ChainError::InvalidEventKind(kind));
        }

        let mut registry = self.registry.write().await;
        let record = registry
            .batches
            .get(&request.batch_id)
            .ok_or_else(|| ChainError::BatchNotFound(request.batch_id.clone()))?;

        if record.events.iter().any(|e| e.event_id == request.event_id) {
            return Err(ChainError::DuplicateEvent(request.event_id));
        }
        if !request.parent_event_id.is_empty()
            && !record
                .events
                .iter()
                .any(|e| e.event_id == request.parent_event_id)
        {
            return Err(ChainError::ParentNotFound(request.parent_event_id));
        }

        let receipt =
            Self::receipt(&mut registry, &format!("{}|{}", request.batch_id, request.event_id));
        let record = registry
            .batches
            .get_mut(&request.batch_id)
            .ok_or_else(|| ChainError::BatchNotFound(request.batch_id.clone()))?;

        record.events.push(Event {
            event_id: request.event_id,
            event_type: kind,
            participant: participant.to_string(),
            ipfs_hash: request.ipfs_hash,
            location: request.location,
            timestamp: Self::now(),
            parent_event_id: request.parent_event_id,
            qr_code_hash: request.qr_code_hash,
        });
        Ok(receipt)
    }

    async fn get_batch_events(&self, batch_id: &str) -> ChainResult<Vec<Event>> {
        let registry = self.registry.read().await;
        Ok(registry
            .batches
            .get(batch_id)
            .map(|record| record.events.clone())
            .unwrap_or_default())
    }

    async fn get_all_batches(&self) -> ChainResult<Vec<Batch>> {
        let registry = self.registry.read().await;
        Ok(registry
            .order
            .iter()
            .filter_map(|batch_id| {
                registry.batches.get(batch_id).map(|record| Batch {
                    batch_id: batch_id.clone(),
                    herb_species: record.herb_species.clone(),
                    creation_time: record.creation_time,
                    event_count: record.events.len() as u64,
                })
            })
            .collect())
    }
}
