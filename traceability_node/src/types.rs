//! Core record types shared across the node: supply-chain events,
//! batches, and the geo tag carried by every on-chain write.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of supply-chain action an event records.
///
/// Encoded as the numeric codes 0..=3 on the wire, matching the batch
/// registry contract tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum EventType {
    Collection,
    QualityTest,
    Processing,
    Manufacturing,
}

impl EventType {
    /// Prefix used when minting event identifiers for this kind.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            EventType::Collection => "COLLECTION",
            EventType::QualityTest => "QUALITY_TEST",
            EventType::Processing => "PROCESSING",
            EventType::Manufacturing => "MANUFACTURING",
        }
    }

    /// Inverse of [`EventType::id_prefix`], for callers that name kinds
    /// by their identifier prefix on the wire.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "COLLECTION" => Some(EventType::Collection),
            "QUALITY_TEST" => Some(EventType::QualityTest),
            "PROCESSING" => Some(EventType::Processing),
            "MANUFACTURING" => Some(EventType::Manufacturing),
            _ => None,
        }
    }

    /// Human-readable name used in statistics and consumer views.
    pub fn display_name(&self) -> &'static str {
        match self {
            EventType::Collection => "Collection",
            EventType::QualityTest => "Quality Test",
            EventType::Processing => "Processing",
            EventType::Manufacturing => "Manufacturing",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl From<EventType> for u8 {
    fn from(kind: EventType) -> Self {
        match kind {
            EventType::Collection => 0,
            EventType::QualityTest => 1,
            EventType::Processing => 2,
            EventType::Manufacturing => 3,
        }
    }
}

impl TryFrom<u8> for EventType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(EventType::Collection),
            1 => Ok(EventType::QualityTest),
            2 => Ok(EventType::Processing),
            3 => Ok(EventType::Manufacturing),
            other => Err(format!("unknown event type code: {}", other)),
        }
    }
}

/// Geo tag recorded alongside an event. Opaque to the provenance engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
    /// Approved harvesting or facility zone.
    #[serde(default)]
    pub zone: String,
}

/// One immutable provenance record within a batch.
///
/// Events are append-only: they are written once by a chain backend and
/// never mutated. Causality is carried exclusively by `parent_event_id`;
/// timestamps are informational and must not be used for ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Globally unique identifier, minted by the writer
    /// (`<TYPE>-<timestamp>-<random>` by convention).
    pub event_id: String,
    pub event_type: EventType,
    /// Address of the actor who recorded the event.
    pub participant: String,
    /// Content hash of the off-chain metadata pinned for this event.
    pub ipfs_hash: String,
    #[serde(default)]
    pub location: Location,
    /// Seconds since epoch, assigned by the recording backend.
    pub timestamp: u64,
    /// Identifier of the parent event; empty for a root.
    #[serde(default)]
    pub parent_event_id: String,
    /// Opaque hash bound to the scannable code for this event.
    #[serde(default)]
    pub qr_code_hash: String,
}

impl Event {
    /// Parent reference, with the empty-string root marker normalized away.
    pub fn parent(&self) -> Option<&str> {
        if self.parent_event_id.is_empty() {
            None
        } else {
            Some(&self.parent_event_id)
        }
    }

    /// Whether this event claims no parent.
    pub fn is_root(&self) -> bool {
        self.parent_event_id.is_empty()
    }
}

/// A herb lot tracked end-to-end, denormalized from its events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub batch_id: String,
    pub herb_species: String,
    /// Timestamp of the root collection event.
    pub creation_time: u64,
    pub event_count: u64,
}
