//! Consumer-facing reporting over the chain's event logs.
//!
//! This layer owns no data: every query fetches a fresh snapshot from
//! the chain backend, runs the pure provenance engine over it, and
//! merges in off-chain metadata and participant profiles. Enrichment is
//! strictly best-effort; one unresolvable document or address never
//! blocks the rest of the answer.

use futures::future::join_all;
use log::{debug, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::chain::{ChainClient, ChainResult};
use crate::identity::{IdentityResolver, ParticipantProfile};
use crate::ipfs::{EventMetadata, MetadataStore};
use crate::provenance::{self, Statistics, TreeNode};
use crate::types::{Batch, Event};

/// Participant address with its directory profile, when registered.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRef {
    pub address: String,
    pub info: Option<ParticipantProfile>,
}

/// One event with its off-chain document and participant profile merged
/// in. Either enrichment may be absent without the event being any less
/// valid.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedEvent {
    pub event_id: String,
    pub event_type: crate::types::EventType,
    pub participant: ParticipantRef,
    pub ipfs_hash: String,
    pub location: crate::types::Location,
    pub timestamp: u64,
    pub parent_event_id: String,
    pub qr_code_hash: String,
    pub metadata: Option<EventMetadata>,
}

impl EnrichedEvent {
    fn bare(event: Event) -> Self {
        Self {
            event_id: event.event_id,
            event_type: event.event_type,
            participant: ParticipantRef {
                address: event.participant,
                info: None,
            },
            ipfs_hash: event.ipfs_hash,
            location: event.location,
            timestamp: event.timestamp,
            parent_event_id: event.parent_event_id,
            qr_code_hash: event.qr_code_hash,
            metadata: None,
        }
    }
}

/// Reconstructed tree node carrying enriched events.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTreeNode {
    #[serde(flatten)]
    pub event: EnrichedEvent,
    pub children: Vec<EnrichedTreeNode>,
    #[serde(skip_serializing_if = "is_false")]
    pub cycle_truncated: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Full provenance answer for "which batch does this event belong to".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProvenance {
    pub batch: Batch,
    pub events: Vec<EnrichedEvent>,
    pub provenance_tree: Vec<EnrichedTreeNode>,
}

/// Root-first trail from the collection event down to one target event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTrail {
    pub batch: Batch,
    pub target_event: EnrichedEvent,
    pub path: Vec<EnrichedEvent>,
}

/// Aggregate statistics answer for one batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatisticsReport {
    pub batch_id: String,
    pub statistics: Statistics,
}

/// Batch listing entry with read-side denormalizations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    #[serde(flatten)]
    pub batch: Batch,
    pub last_updated: u64,
    /// Distinct participants seen in the batch's events.
    pub participants: usize,
}

pub struct TrackingService {
    chain: Arc<dyn ChainClient>,
    metadata: Arc<dyn MetadataStore>,
    identity: Arc<dyn IdentityResolver>,
}

impl TrackingService {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        metadata: Arc<dyn MetadataStore>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            chain,
            metadata,
            identity,
        }
    }

    /// Batch provenance for the batch containing `event_id`: the
    /// enriched event list plus the reconstructed tree. `None` when no
    /// batch contains the event.
    pub async fn batch_by_event(&self, event_id: &str) -> ChainResult<Option<BatchProvenance>> {
        let Some((batch, events)) = self.locate_batch(event_id).await? else {
            return Ok(None);
        };
        self.log_integrity(&batch.batch_id, &events);

        let tree = provenance::build_tree(&events);
        let enriched = self.enrich_all(&events).await;

        let lookup: HashMap<&str, &EnrichedEvent> =
            enriched.iter().map(|e| (e.event_id.as_str(), e)).collect();
        let provenance_tree = tree
            .into_iter()
            .map(|node| Self::enrich_node(node, &lookup))
            .collect();

        Ok(Some(BatchProvenance {
            batch,
            events: enriched,
            provenance_tree,
        }))
    }

    /// Root-first trail ending at `event_id`, with every event on the
    /// trail enriched. `None` when no batch contains the event.
    pub async fn path_to_event(&self, event_id: &str) -> ChainResult<Option<EventTrail>> {
        let Some((batch, events)) = self.locate_batch(event_id).await? else {
            return Ok(None);
        };
        self.log_integrity(&batch.batch_id, &events);

        let path = provenance::find_path(&events, event_id);
        let enriched_path = self.enrich_all(&path).await;
        let Some(target_event) = enriched_path.last().cloned() else {
            return Ok(None);
        };

        Ok(Some(EventTrail {
            batch,
            target_event,
            path: enriched_path,
        }))
    }

    /// Aggregate statistics for a batch. `None` when the batch has no
    /// events, so callers never see a time span computed over nothing.
    pub async fn batch_statistics(
        &self,
        batch_id: &str,
    ) -> ChainResult<Option<BatchStatisticsReport>> {
        let events = self.chain.get_batch_events(batch_id).await?;
        if events.is_empty() {
            return Ok(None);
        }
        self.log_integrity(batch_id, &events);

        Ok(Some(BatchStatisticsReport {
            batch_id: batch_id.to_string(),
            statistics: provenance::compute_statistics(&events),
        }))
    }

    /// Every batch with event count, last activity, and participant
    /// summaries.
    pub async fn list_batches(&self) -> ChainResult<Vec<BatchSummary>> {
        let mut summaries = Vec::new();
        for mut batch in self.chain.get_all_batches().await? {
            let events = self.chain.get_batch_events(&batch.batch_id).await?;
            let last_updated = events
                .iter()
                .map(|e| e.timestamp)
                .max()
                .unwrap_or(batch.creation_time);
            let participants = events
                .iter()
                .map(|e| e.participant.as_str())
                .collect::<HashSet<_>>()
                .len();
            batch.event_count = events.len() as u64;
            summaries.push(BatchSummary {
                batch,
                last_updated,
                participants,
            });
        }
        Ok(summaries)
    }

    async fn locate_batch(&self, event_id: &str) -> ChainResult<Option<(Batch, Vec<Event>)>> {
        for batch in self.chain.get_all_batches().await? {
            let events = self.chain.get_batch_events(&batch.batch_id).await?;
            if events.iter().any(|e| e.event_id == event_id) {
                return Ok(Some((batch, events)));
            }
        }
        Ok(None)
    }

    async fn enrich(&self, event: &Event) -> EnrichedEvent {
        let metadata = match self.metadata.fetch(&event.ipfs_hash).await {
            Ok(document) => Some(document),
            Err(err) => {
                debug!(
                    "metadata unavailable for event {}: {}",
                    event.event_id, err
                );
                None
            }
        };
        let info = self.identity.resolve(&event.participant).await;

        let mut enriched = EnrichedEvent::bare(event.clone());
        enriched.metadata = metadata;
        enriched.participant.info = info;
        enriched
    }

    async fn enrich_all(&self, events: &[Event]) -> Vec<EnrichedEvent> {
        join_all(events.iter().map(|event| self.enrich(event))).await
    }

    fn enrich_node(node: TreeNode, lookup: &HashMap<&str, &EnrichedEvent>) -> EnrichedTreeNode {
        let TreeNode {
            event,
            children,
            cycle_truncated,
        } = node;
        let event = lookup
            .get(event.event_id.as_str())
            .map(|e| (*e).clone())
            .unwrap_or_else(|| EnrichedEvent::bare(event));
        EnrichedTreeNode {
            event,
            children: children
                .into_iter()
                .map(|child| Self::enrich_node(child, lookup))
                .collect(),
            cycle_truncated,
        }
    }

    fn log_integrity(&self, batch_id: &str, events: &[Event]) {
        for warning in provenance::audit(events) {
            warn!("integrity warning in batch {}: {:?}", batch_id, warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{AddEventRequest, CreateBatchRequest, MemoryChain};
    use crate::identity::{InMemoryDirectory, ParticipantProfile, ParticipantRole};
    use crate::ipfs::metadata::{CollectionMetadata, MetadataLocation, QualityTestMetadata, TestResults};
    use crate::ipfs::{IpfsError, IpfsResult, MemoryStore, PinReceipt};
    use crate::types::EventType;
    use async_trait::async_trait;

    struct Fixture {
        service: TrackingService,
        chain: Arc<MemoryChain>,
    }

    fn collection_doc() -> EventMetadata {
        EventMetadata::Collection(CollectionMetadata {
            timestamp: "2024-06-01T08:00:00Z".to_string(),
            batch_id: "HERB-100".to_string(),
            herb_species: "Ashwagandha".to_string(),
            collector: "0xcollector".to_string(),
            weight: 18.0,
            harvest_date: "2024-06-01".to_string(),
            location: MetadataLocation::default(),
            quality_grade: "A".to_string(),
            notes: String::new(),
            images: vec![],
        })
    }

    fn quality_doc(event_id: &str) -> EventMetadata {
        EventMetadata::QualityTest(QualityTestMetadata {
            timestamp: "2024-06-02T08:00:00Z".to_string(),
            batch_id: "HERB-100".to_string(),
            event_id: event_id.to_string(),
            parent_event_id: "COLLECTION-1".to_string(),
            tester: "0xtester".to_string(),
            test_results: TestResults {
                moisture_content: 7.5,
                purity: 98.4,
                pesticide_level: 0.02,
                ..Default::default()
            },
            test_method: "HPLC".to_string(),
            test_date: "2024-06-02".to_string(),
            certification: String::new(),
            notes: String::new(),
            images: vec![],
        })
    }

    /// Memory chain seeded with a four-stage batch, documents pinned in
    /// the given store, and the collector registered in the directory.
    async fn seed(store: Arc<dyn MetadataStore>) -> Fixture {
        let chain = Arc::new(MemoryChain::new());
        let directory = Arc::new(InMemoryDirectory::new());
        directory
            .register(
                "0xcollector",
                ParticipantProfile {
                    name: "Ramesh Kumar".to_string(),
                    organization: "Himalayan Herb Collectors".to_string(),
                    role: ParticipantRole::Collector,
                },
            )
            .await;

        let collection_pin = store
            .upload_json(&collection_doc(), "collection-HERB-100")
            .await
            .unwrap();
        chain
            .create_batch(
                "0xcollector",
                CreateBatchRequest {
                    batch_id: "HERB-100".to_string(),
                    herb_species: "Ashwagandha".to_string(),
                    collection_event_id: "COLLECTION-1".to_string(),
                    ipfs_hash: collection_pin.ipfs_hash,
                    location: Default::default(),
                    qr_code_hash: String::new(),
                },
            )
            .await
            .unwrap();

        let quality_pin = store
            .upload_json(&quality_doc("QUALITY_TEST-1"), "quality-test-QUALITY_TEST-1")
            .await
            .unwrap();
        let stages = [
            (EventType::QualityTest, "QUALITY_TEST-1", "COLLECTION-1", "0xtester", quality_pin.ipfs_hash),
            (EventType::Processing, "PROCESSING-1", "QUALITY_TEST-1", "0xprocessor", "QmUnpinnedProcessing".to_string()),
            (EventType::Manufacturing, "MANUFACTURING-1", "PROCESSING-1", "0xmanufacturer", "QmUnpinnedManufacturing".to_string()),
        ];
        for (kind, event_id, parent, participant, ipfs_hash) in stages {
            chain
                .add_event(
                    participant,
                    kind,
                    AddEventRequest {
                        batch_id: "HERB-100".to_string(),
                        event_id: event_id.to_string(),
                        parent_event_id: parent.to_string(),
                        ipfs_hash,
                        location: Default::default(),
                        qr_code_hash: String::new(),
                    },
                )
                .await
                .unwrap();
        }

        let service = TrackingService::new(chain.clone(), store, directory);
        Fixture { service, chain }
    }

    fn depth(node: &EnrichedTreeNode) -> usize {
        1 + node.children.iter().map(depth).max().unwrap_or(0)
    }

    #[tokio::test]
    async fn batch_by_event_reconstructs_and_enriches() {
        let fixture = seed(Arc::new(MemoryStore::new())).await;
        let provenance = fixture
            .service
            .batch_by_event("QUALITY_TEST-1")
            .await
            .unwrap()
            .expect("event belongs to the seeded batch");

        assert_eq!(provenance.batch.batch_id, "HERB-100");
        assert_eq!(provenance.events.len(), 4);
        assert_eq!(provenance.provenance_tree.len(), 1);
        assert_eq!(depth(&provenance.provenance_tree[0]), 4);

        let collection = provenance
            .events
            .iter()
            .find(|e| e.event_id == "COLLECTION-1")
            .unwrap();
        assert!(matches!(collection.metadata, Some(EventMetadata::Collection(_))));
        assert_eq!(
            collection.participant.info.as_ref().map(|p| p.name.as_str()),
            Some("Ramesh Kumar")
        );

        // Documents were never pinned for these two; the events still
        // come back, just without metadata.
        let processing = provenance
            .events
            .iter()
            .find(|e| e.event_id == "PROCESSING-1")
            .unwrap();
        assert!(processing.metadata.is_none());
        assert!(processing.participant.info.is_none());
    }

    #[tokio::test]
    async fn path_to_event_returns_the_root_first_trail() {
        let fixture = seed(Arc::new(MemoryStore::new())).await;
        let trail = fixture
            .service
            .path_to_event("MANUFACTURING-1")
            .await
            .unwrap()
            .expect("event exists");

        let ids: Vec<&str> = trail.path.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["COLLECTION-1", "QUALITY_TEST-1", "PROCESSING-1", "MANUFACTURING-1"]
        );
        assert_eq!(trail.target_event.event_id, "MANUFACTURING-1");
        assert_eq!(trail.batch.batch_id, "HERB-100");
    }

    #[tokio::test]
    async fn unknown_events_answer_none() {
        let fixture = seed(Arc::new(MemoryStore::new())).await;
        assert!(fixture.service.batch_by_event("NOPE").await.unwrap().is_none());
        assert!(fixture.service.path_to_event("NOPE").await.unwrap().is_none());
        assert!(fixture
            .service
            .batch_statistics("HERB-404")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn batch_statistics_summarize_the_event_log() {
        let fixture = seed(Arc::new(MemoryStore::new())).await;
        let report = fixture
            .service
            .batch_statistics("HERB-100")
            .await
            .unwrap()
            .expect("batch has events");

        let stats = &report.statistics;
        assert_eq!(stats.total_events, 4);
        assert_eq!(stats.participant_count, 4);
        assert_eq!(stats.event_type_counts["Collection"], 1);
        assert_eq!(stats.branches.total_branches, 3);
        assert_eq!(stats.branches.max_branching_factor, 1);
        assert!(stats.time_span.is_some());
    }

    #[tokio::test]
    async fn list_batches_denormalizes_summaries() {
        let fixture = seed(Arc::new(MemoryStore::new())).await;
        let summaries = fixture.service.list_batches().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].batch.batch_id, "HERB-100");
        assert_eq!(summaries[0].batch.event_count, 4);
        assert_eq!(summaries[0].participants, 4);
        assert!(summaries[0].last_updated >= summaries[0].batch.creation_time);

        // Still answers when the batch summary is requested through the
        // chain listing even if more batches appear later.
        fixture
            .chain
            .create_batch(
                "0xcollector",
                CreateBatchRequest {
                    batch_id: "HERB-101".to_string(),
                    herb_species: "Brahmi".to_string(),
                    collection_event_id: "COLLECTION-2".to_string(),
                    ipfs_hash: "QmOther".to_string(),
                    location: Default::default(),
                    qr_code_hash: String::new(),
                },
            )
            .await
            .unwrap();
        let summaries = fixture.service.list_batches().await.unwrap();
        assert_eq!(summaries.len(), 2);
    }

    /// Store whose fetch always fails; uploads still succeed.
    struct BrokenFetchStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl MetadataStore for BrokenFetchStore {
        async fn upload_json(
            &self,
            metadata: &EventMetadata,
            name: &str,
        ) -> IpfsResult<PinReceipt> {
            self.inner.upload_json(metadata, name).await
        }

        async fn fetch(&self, ipfs_hash: &str) -> IpfsResult<EventMetadata> {
            Err(IpfsError::NotFound(ipfs_hash.to_string()))
        }
    }

    #[tokio::test]
    async fn metadata_outage_never_blocks_tracking_queries() {
        let fixture = seed(Arc::new(BrokenFetchStore {
            inner: MemoryStore::new(),
        }))
        .await;

        let provenance = fixture
            .service
            .batch_by_event("COLLECTION-1")
            .await
            .unwrap()
            .expect("chain data is intact");
        assert_eq!(provenance.events.len(), 4);
        assert!(provenance.events.iter().all(|e| e.metadata.is_none()));
        assert_eq!(provenance.provenance_tree.len(), 1);
    }
}
