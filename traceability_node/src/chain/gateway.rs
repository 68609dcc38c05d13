//! Chain backend that delegates to a remote HerbionYX node over HTTP.
//!
//! The remote node owns the actual ledger connection and signing; this
//! client only speaks the `/api/blockchain/*` JSON surface and maps its
//! success/error envelopes onto [`ChainError`].

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{
    AddEventRequest, ChainClient, ChainError, ChainReceipt, ChainResult, CreateBatchRequest,
};
use crate::config::GatewayConfig;
use crate::types::{Batch, Event, EventType};

pub struct GatewayChain {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: serde::de::DeserializeOwned")]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteResult {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    transaction_hash: Option<String>,
    #[serde(default)]
    block_number: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBatchBody<'a> {
    user_address: &'a str,
    batch_data: &'a CreateBatchRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddEventBody<'a> {
    user_address: &'a str,
    event_data: &'a AddEventRequest,
}

impl GatewayChain {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/blockchain/{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_envelope<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> ChainResult<T> {
        let status = response.status();
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;
        if !status.is_success() || !envelope.success {
            return Err(ChainError::Gateway(
                envelope
                    .error
                    .unwrap_or_else(|| format!("gateway returned status {}", status)),
            ));
        }
        envelope
            .data
            .ok_or_else(|| ChainError::InvalidResponse("missing data field".to_string()))
    }

    fn receipt_from(result: WriteResult) -> ChainResult<ChainReceipt> {
        if !result.success {
            return Err(ChainError::Gateway(
                result.error.unwrap_or_else(|| "write rejected".to_string()),
            ));
        }
        Ok(ChainReceipt {
            transaction_hash: result
                .transaction_hash
                .ok_or_else(|| ChainError::InvalidResponse("missing transactionHash".to_string()))?,
            block_number: result.block_number.unwrap_or(0),
        })
    }
}

#[async_trait]
impl ChainClient for GatewayChain {
    async fn create_batch(
        &self,
        participant: &str,
        request: CreateBatchRequest,
    ) -> ChainResult<ChainReceipt> {
        debug!("gateway create-batch {}", request.batch_id);
        let response = self
            .authorize(self.http.post(self.url("create-batch")))
            .json(&CreateBatchBody {
                user_address: participant,
                batch_data: &request,
            })
            .send()
            .await?;
        Self::receipt_from(Self::read_envelope::<WriteResult>(response).await?)
    }

    async fn add_event(
        &self,
        participant: &str,
        kind: EventType,
        request: AddEventRequest,
    ) -> ChainResult<ChainReceipt> {
        let path = match kind {
            EventType::QualityTest => "add-quality-test",
            EventType::Processing => "add-processing",
            EventType::Manufacturing => "add-manufacturing",
            EventType::Collection => return Err(ChainError::InvalidEventKind(kind)),
        };
        debug!("gateway {} {}", path, request.event_id);
        let response = self
            .authorize(self.http.post(self.url(path)))
            .json(&AddEventBody {
                user_address: participant,
                event_data: &request,
            })
            .send()
            .await?;
        Self::receipt_from(Self::read_envelope::<WriteResult>(response).await?)
    }

    async fn get_batch_events(&self, batch_id: &str) -> ChainResult<Vec<Event>> {
        let response = self
            .authorize(
                self.http
                    .get(self.url(&format!("batch-events/{}", batch_id))),
            )
            .send()
            .await?;
        Self::read_envelope(response).await
    }

    async fn get_all_batches(&self) -> ChainResult<Vec<Batch>> {
        let response = self
            .authorize(self.http.get(self.url("all-batches")))
            .send()
            .await?;
        Self::read_envelope(response).await
    }
}
