//! Consumer-facing tracking routes: provenance trees, trails, and
//! statistics resolved from a scanned event identifier.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::api::errors::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::provenance::Statistics;
use crate::tracking::{BatchSummary, EnrichedEvent, EnrichedTreeNode};
use crate::types::Batch;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPayload {
    #[serde(flatten)]
    pub batch: Batch,
    pub events: Vec<EnrichedEvent>,
    pub provenance_tree: Vec<EnrichedTreeNode>,
}

#[derive(Debug, Serialize)]
pub struct BatchTrackingResponse {
    pub success: bool,
    pub batch: BatchPayload,
}

/// `GET /api/tracking/batch/:event_id`
pub async fn get_batch_by_event(
    Path(event_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<BatchTrackingResponse>> {
    if event_id.trim().is_empty() {
        return Err(ApiError::bad_request("Event ID is required"));
    }

    let provenance = state
        .tracking
        .batch_by_event(&event_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Batch not found for this event ID"))?;

    Ok(Json(BatchTrackingResponse {
        success: true,
        batch: BatchPayload {
            batch: provenance.batch,
            events: provenance.events,
            provenance_tree: provenance.provenance_tree,
        },
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResponse {
    pub success: bool,
    pub batch: Batch,
    pub target_event: EnrichedEvent,
    pub path: Vec<EnrichedEvent>,
}

/// `GET /api/tracking/path/:event_id`
pub async fn get_event_path(
    Path(event_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<PathResponse>> {
    let trail = state
        .tracking
        .path_to_event(&event_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;

    Ok(Json(PathResponse {
        success: true,
        batch: trail.batch,
        target_event: trail.target_event,
        path: trail.path,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    pub success: bool,
    pub batch_id: String,
    pub statistics: Statistics,
}

/// `GET /api/tracking/stats/:batch_id`
pub async fn get_batch_statistics(
    Path(batch_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<StatisticsResponse>> {
    let report = state
        .tracking
        .batch_statistics(&batch_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Batch not found"))?;

    Ok(Json(StatisticsResponse {
        success: true,
        batch_id: report.batch_id,
        statistics: report.statistics,
    }))
}

#[derive(Debug, Serialize)]
pub struct BatchListResponse {
    pub success: bool,
    pub batches: Vec<BatchSummary>,
}

/// `GET /api/tracking/batches`
pub async fn list_batches(State(state): State<AppState>) -> ApiResult<Json<BatchListResponse>> {
    let batches = state.tracking.list_batches().await?;
    Ok(Json(BatchListResponse {
        success: true,
        batches,
    }))
}
