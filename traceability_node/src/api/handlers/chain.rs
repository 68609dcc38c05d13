//! Write-path and raw-read routes over the configured chain backend.
//!
//! Callers may either pin a metadata document themselves and send its
//! hash, or send the typed document inline and let the node pin it
//! before the chain write. Identifiers are minted server-side when the
//! caller does not supply them.

use axum::{
    extract::{Path, State},
    Json,
};
use log::info;
use serde::{Deserialize, Serialize};

use crate::api::errors::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::chain::{AddEventRequest, CreateBatchRequest};
use crate::ipfs::EventMetadata;
use crate::types::{Batch, Event, EventType, Location};
use crate::utils::ids;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub batch_id: String,
    pub event_id: String,
    pub ipfs_hash: String,
    pub transaction_hash: String,
    pub block_number: u64,
}

#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub success: bool,
    pub data: WriteOutcome,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchBody {
    #[serde(default)]
    pub user_address: String,
    pub batch_data: CreateBatchData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchData {
    #[serde(default)]
    pub batch_id: Option<String>,
    pub herb_species: String,
    #[serde(default)]
    pub collection_event_id: Option<String>,
    #[serde(default)]
    pub ipfs_hash: Option<String>,
    /// Inline document to pin when `ipfs_hash` is not supplied.
    #[serde(default)]
    pub metadata: Option<EventMetadata>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub qr_code_hash: Option<String>,
}

/// Resolve the content hash for a write: prefer a caller-supplied hash,
/// otherwise pin the inline document.
async fn resolve_ipfs_hash(
    state: &AppState,
    ipfs_hash: Option<String>,
    metadata: Option<EventMetadata>,
    expected_kind: EventType,
) -> ApiResult<String> {
    if let Some(hash) = ipfs_hash.filter(|h| !h.is_empty()) {
        return Ok(hash);
    }
    let Some(document) = metadata else {
        return Err(ApiError::bad_request("ipfsHash or metadata is required"));
    };
    if document.kind() != expected_kind {
        return Err(ApiError::bad_request(&format!(
            "metadata document is {}, expected {}",
            document.kind(),
            expected_kind
        )));
    }
    let receipt = state
        .metadata
        .upload_json(&document, &document.pin_name())
        .await?;
    Ok(receipt.ipfs_hash)
}

/// `POST /api/blockchain/create-batch`
pub async fn create_batch(
    State(state): State<AppState>,
    Json(body): Json<CreateBatchBody>,
) -> ApiResult<Json<WriteResponse>> {
    if body.user_address.is_empty() {
        return Err(ApiError::bad_request("Missing required fields"));
    }
    let data = body.batch_data;

    let batch_id = data
        .batch_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(ids::generate_batch_id);
    let event_id = data
        .collection_event_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| ids::generate_event_id(EventType::Collection));
    let ipfs_hash =
        resolve_ipfs_hash(&state, data.ipfs_hash, data.metadata, EventType::Collection).await?;
    let qr_code_hash = data
        .qr_code_hash
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| ids::qr_code_hash(&batch_id, &event_id));

    let receipt = state
        .chain
        .create_batch(
            &body.user_address,
            CreateBatchRequest {
                batch_id: batch_id.clone(),
                herb_species: data.herb_species,
                collection_event_id: event_id.clone(),
                ipfs_hash: ipfs_hash.clone(),
                location: data.location,
                qr_code_hash,
            },
        )
        .await?;
    info!("batch {} created by {}", batch_id, body.user_address);

    Ok(Json(WriteResponse {
        success: true,
        data: WriteOutcome {
            batch_id,
            event_id,
            ipfs_hash,
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        },
        message: "Batch created successfully".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEventBody {
    #[serde(default)]
    pub user_address: String,
    pub event_data: AddEventData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEventData {
    pub batch_id: String,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub parent_event_id: String,
    #[serde(default)]
    pub ipfs_hash: Option<String>,
    #[serde(default)]
    pub metadata: Option<EventMetadata>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub qr_code_hash: Option<String>,
}

async fn append_event(
    state: AppState,
    kind: EventType,
    body: AddEventBody,
) -> ApiResult<Json<WriteResponse>> {
    if body.user_address.is_empty() || body.event_data.batch_id.is_empty() {
        return Err(ApiError::bad_request("Missing required fields"));
    }
    let data = body.event_data;

    let event_id = data
        .event_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| ids::generate_event_id(kind));
    let ipfs_hash = resolve_ipfs_hash(&state, data.ipfs_hash, data.metadata, kind).await?;
    let qr_code_hash = data
        .qr_code_hash
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| ids::qr_code_hash(&data.batch_id, &event_id));

    let receipt = state
        .chain
        .add_event(
            &body.user_address,
            kind,
            AddEventRequest {
                batch_id: data.batch_id.clone(),
                event_id: event_id.clone(),
                parent_event_id: data.parent_event_id,
                ipfs_hash: ipfs_hash.clone(),
                location: data.location,
                qr_code_hash,
            },
        )
        .await?;
    info!(
        "{} event {} appended to {} by {}",
        kind, event_id, data.batch_id, body.user_address
    );

    Ok(Json(WriteResponse {
        success: true,
        data: WriteOutcome {
            batch_id: data.batch_id,
            event_id,
            ipfs_hash,
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        },
        message: format!("{} event added successfully", kind),
    }))
}

/// `POST /api/blockchain/add-quality-test`
pub async fn add_quality_test(
    State(state): State<AppState>,
    Json(body): Json<AddEventBody>,
) -> ApiResult<Json<WriteResponse>> {
    append_event(state, EventType::QualityTest, body).await
}

/// `POST /api/blockchain/add-processing`
pub async fn add_processing(
    State(state): State<AppState>,
    Json(body): Json<AddEventBody>,
) -> ApiResult<Json<WriteResponse>> {
    append_event(state, EventType::Processing, body).await
}

/// `POST /api/blockchain/add-manufacturing`
pub async fn add_manufacturing(
    State(state): State<AppState>,
    Json(body): Json<AddEventBody>,
) -> ApiResult<Json<WriteResponse>> {
    append_event(state, EventType::Manufacturing, body).await
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub success: bool,
    pub data: Vec<Event>,
}

/// `GET /api/blockchain/batch-events/:batch_id`
pub async fn get_batch_events(
    Path(batch_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<EventsResponse>> {
    if batch_id.trim().is_empty() {
        return Err(ApiError::bad_request("Batch ID is required"));
    }
    let events = state.chain.get_batch_events(&batch_id).await?;
    Ok(Json(EventsResponse {
        success: true,
        data: events,
    }))
}

#[derive(Debug, Serialize)]
pub struct BatchesResponse {
    pub success: bool,
    pub data: Vec<Batch>,
}

/// `GET /api/blockchain/all-batches`
pub async fn get_all_batches(State(state): State<AppState>) -> ApiResult<Json<BatchesResponse>> {
    let batches = state.chain.get_all_batches().await?;
    Ok(Json(BatchesResponse {
        success: true,
        data: batches,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedBatchId {
    pub batch_id: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateBatchIdResponse {
    pub success: bool,
    pub data: GeneratedBatchId,
}

/// `GET /api/blockchain/generate-batch-id`
pub async fn generate_batch_id() -> Json<GenerateBatchIdResponse> {
    Json(GenerateBatchIdResponse {
        success: true,
        data: GeneratedBatchId {
            batch_id: ids::generate_batch_id(),
        },
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateEventIdBody {
    /// Kind named by its identifier prefix, e.g. `QUALITY_TEST`.
    pub event_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedEventId {
    pub event_id: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateEventIdResponse {
    pub success: bool,
    pub data: GeneratedEventId,
}

/// `POST /api/blockchain/generate-event-id`
pub async fn generate_event_id(
    Json(body): Json<GenerateEventIdBody>,
) -> ApiResult<Json<GenerateEventIdResponse>> {
    let kind = EventType::from_prefix(&body.event_type)
        .ok_or_else(|| ApiError::bad_request("Event type is required"))?;
    Ok(Json(GenerateEventIdResponse {
        success: true,
        data: GeneratedEventId {
            event_id: ids::generate_event_id(kind),
        },
    }))
}
