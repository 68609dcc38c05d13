//! Typed off-chain metadata, one shape per event kind.
//!
//! The chain only stores a content hash; the document behind it is this
//! tagged union. The `type` field on the wire selects the variant, so a
//! consumer can decode a pinned document without knowing which event it
//! belongs to.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::EventType;

/// Geo tag as written into pinned documents; unlike the on-chain tuple
/// it may carry a free-form address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataLocation {
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionMetadata {
    /// RFC 3339 creation time of the document itself.
    pub timestamp: String,
    pub batch_id: String,
    pub herb_species: String,
    pub collector: String,
    pub weight: f64,
    pub harvest_date: String,
    pub location: MetadataLocation,
    #[serde(default)]
    pub quality_grade: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub moisture_content: f64,
    pub purity: f64,
    pub pesticide_level: f64,
    #[serde(default)]
    pub heavy_metals: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub microbiological: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub active_compounds: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityTestMetadata {
    pub timestamp: String,
    pub batch_id: String,
    pub event_id: String,
    #[serde(default)]
    pub parent_event_id: String,
    pub tester: String,
    pub test_results: TestResults,
    #[serde(default)]
    pub test_method: String,
    #[serde(default)]
    pub test_date: String,
    #[serde(default)]
    pub certification: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingDetails {
    pub method: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub duration: String,
    #[serde(rename = "yield", default)]
    pub yield_amount: f64,
    #[serde(default)]
    pub equipment: String,
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingMetadata {
    pub timestamp: String,
    pub batch_id: String,
    pub event_id: String,
    #[serde(default)]
    pub parent_event_id: String,
    pub processor: String,
    pub processing_details: ProcessingDetails,
    #[serde(default)]
    pub process_date: String,
    #[serde(default)]
    pub output_product: String,
    #[serde(default)]
    pub quality_metrics: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub name: String,
    #[serde(rename = "type", default)]
    pub product_type: String,
    /// Powder, capsule, extract, and the like.
    #[serde(default)]
    pub form: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub batch_size: String,
    #[serde(default)]
    pub expiry_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Packaging {
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityControl {
    #[serde(default)]
    pub tests: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub standards: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturingMetadata {
    pub timestamp: String,
    pub batch_id: String,
    pub event_id: String,
    #[serde(default)]
    pub parent_event_id: String,
    pub manufacturer: String,
    pub product: ProductDetails,
    #[serde(default)]
    pub packaging: Packaging,
    #[serde(default)]
    pub quality_control: QualityControl,
    #[serde(default)]
    pub manufacturing_date: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Off-chain document for one provenance event, tagged by event kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventMetadata {
    Collection(CollectionMetadata),
    QualityTest(QualityTestMetadata),
    Processing(ProcessingMetadata),
    Manufacturing(ManufacturingMetadata),
}

impl EventMetadata {
    pub fn kind(&self) -> EventType {
        match self {
            EventMetadata::Collection(_) => EventType::Collection,
            EventMetadata::QualityTest(_) => EventType::QualityTest,
            EventMetadata::Processing(_) => EventType::Processing,
            EventMetadata::Manufacturing(_) => EventType::Manufacturing,
        }
    }

    /// Display name the document is pinned under.
    pub fn pin_name(&self) -> String {
        match self {
            EventMetadata::Collection(m) => format!("collection-{}", m.batch_id),
            EventMetadata::QualityTest(m) => format!("quality-test-{}", m.event_id),
            EventMetadata::Processing(m) => format!("processing-{}", m.event_id),
            EventMetadata::Manufacturing(m) => format!("manufacturing-{}", m.event_id),
        }
    }
}
