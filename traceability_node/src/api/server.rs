//! Router assembly and server loop.

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::api::handlers::{chain as chain_handlers, status, tracking as tracking_handlers};
use crate::chain::ChainClient;
use crate::ipfs::MetadataStore;
use crate::tracking::TrackingService;

/// Shared handler state. Everything is behind an `Arc`, so cloning per
/// request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub tracking: Arc<TrackingService>,
    pub chain: Arc<dyn ChainClient>,
    pub metadata: Arc<dyn MetadataStore>,
    /// Backend label surfaced by the health route.
    pub chain_backend: String,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(status::health_check))
        .route(
            "/api/tracking/batch/:event_id",
            get(tracking_handlers::get_batch_by_event),
        )
        .route(
            "/api/tracking/path/:event_id",
            get(tracking_handlers::get_event_path),
        )
        .route(
            "/api/tracking/stats/:batch_id",
            get(tracking_handlers::get_batch_statistics),
        )
        .route("/api/tracking/batches", get(tracking_handlers::list_batches))
        .route(
            "/api/blockchain/create-batch",
            post(chain_handlers::create_batch),
        )
        .route(
            "/api/blockchain/add-quality-test",
            post(chain_handlers::add_quality_test),
        )
        .route(
            "/api/blockchain/add-processing",
            post(chain_handlers::add_processing),
        )
        .route(
            "/api/blockchain/add-manufacturing",
            post(chain_handlers::add_manufacturing),
        )
        .route(
            "/api/blockchain/batch-events/:batch_id",
            get(chain_handlers::get_batch_events),
        )
        .route(
            "/api/blockchain/all-batches",
            get(chain_handlers::get_all_batches),
        )
        .route(
            "/api/blockchain/generate-batch-id",
            get(chain_handlers::generate_batch_id),
        )
        .route(
            "/api/blockchain/generate-event-id",
            post(chain_handlers::generate_event_id),
        )
        .layer(cors)
        .with_state(state)
}

pub struct ApiServer {
    port: u16,
    state: AppState,
}

impl ApiServer {
    pub fn new(port: u16, state: AppState) -> Self {
        Self { port, state }
    }

    pub async fn run(self) -> Result<()> {
        let app = build_router(self.state);
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", self.port)).await?;
        info!("traceability node listening on {}", listener.local_addr()?);
        axum::serve(listener, app).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MemoryChain;
    use crate::identity::InMemoryDirectory;
    use crate::ipfs::MemoryStore;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    fn demo_state() -> AppState {
        let chain = Arc::new(MemoryChain::new());
        let metadata = Arc::new(MemoryStore::new());
        let identity = Arc::new(InMemoryDirectory::new());
        AppState {
            tracking: Arc::new(TrackingService::new(
                chain.clone(),
                metadata.clone(),
                identity,
            )),
            chain,
            metadata,
            chain_backend: "memory".to_string(),
        }
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let request = match body {
            Some(json) => Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_reports_the_backend() {
        let router = build_router(demo_state());
        let (status, body) = send(&router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["chain_backend"], "memory");
    }

    #[tokio::test]
    async fn write_path_then_tracking_round_trip() {
        let router = build_router(demo_state());

        let collection_metadata = serde_json::json!({
            "type": "collection",
            "timestamp": "2024-06-01T08:00:00Z",
            "batchId": "HERB-500",
            "herbSpecies": "Ashwagandha",
            "collector": "0xcollector",
            "weight": 10.0,
            "harvestDate": "2024-06-01",
            "location": { "zone": "Zone-A" }
        });
        let (status, body) = send(
            &router,
            Method::POST,
            "/api/blockchain/create-batch",
            Some(serde_json::json!({
                "userAddress": "0xcollector",
                "batchData": {
                    "batchId": "HERB-500",
                    "herbSpecies": "Ashwagandha",
                    "collectionEventId": "COLLECTION-500",
                    "metadata": collection_metadata,
                    "location": { "zone": "Zone-A" }
                }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["batchId"], "HERB-500");
        assert!(body["data"]["ipfsHash"].as_str().unwrap().starts_with("Qm"));
        assert!(body["data"]["transactionHash"]
            .as_str()
            .unwrap()
            .starts_with("0x"));

        let quality_metadata = serde_json::json!({
            "type": "quality_test",
            "timestamp": "2024-06-02T08:00:00Z",
            "batchId": "HERB-500",
            "eventId": "QUALITY_TEST-500",
            "parentEventId": "COLLECTION-500",
            "tester": "0xtester",
            "testResults": { "moistureContent": 8.0, "purity": 99.0, "pesticideLevel": 0.01 },
        });
        let (status, body) = send(
            &router,
            Method::POST,
            "/api/blockchain/add-quality-test",
            Some(serde_json::json!({
                "userAddress": "0xtester",
                "eventData": {
                    "batchId": "HERB-500",
                    "eventId": "QUALITY_TEST-500",
                    "parentEventId": "COLLECTION-500",
                    "metadata": quality_metadata
                }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["eventId"], "QUALITY_TEST-500");

        let (status, body) = send(
            &router,
            Method::GET,
            "/api/tracking/batch/QUALITY_TEST-500",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["batch"]["batchId"], "HERB-500");
        assert_eq!(body["batch"]["events"].as_array().unwrap().len(), 2);
        assert_eq!(body["batch"]["provenanceTree"].as_array().unwrap().len(), 1);
        assert_eq!(
            body["batch"]["provenanceTree"][0]["children"][0]["eventId"],
            "QUALITY_TEST-500"
        );
        assert_eq!(
            body["batch"]["events"][0]["metadata"]["type"],
            "collection"
        );

        let (status, body) = send(
            &router,
            Method::GET,
            "/api/tracking/path/QUALITY_TEST-500",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let path = body["path"].as_array().unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path[0]["eventId"], "COLLECTION-500");
        assert_eq!(path[1]["eventId"], "QUALITY_TEST-500");

        let (status, body) = send(
            &router,
            Method::GET,
            "/api/tracking/stats/HERB-500",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["statistics"]["totalEvents"], 2);
        assert_eq!(body["statistics"]["branches"]["totalBranches"], 1);
    }

    #[tokio::test]
    async fn unknown_event_is_a_404_envelope() {
        let router = build_router(demo_state());
        let (status, body) = send(&router, Method::GET, "/api/tracking/batch/NOPE", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 404);
    }

    #[tokio::test]
    async fn write_without_document_or_hash_is_rejected() {
        let router = build_router(demo_state());
        let (status, _) = send(
            &router,
            Method::POST,
            "/api/blockchain/create-batch",
            Some(serde_json::json!({
                "userAddress": "0xcollector",
                "batchData": { "herbSpecies": "Tulsi" }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generate_endpoints_mint_well_formed_ids() {
        let router = build_router(demo_state());

        let (status, body) =
            send(&router, Method::GET, "/api/blockchain/generate-batch-id", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["batchId"].as_str().unwrap().starts_with("HERB-"));

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/blockchain/generate-event-id",
            Some(serde_json::json!({ "eventType": "PROCESSING" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["eventId"]
            .as_str()
            .unwrap()
            .starts_with("PROCESSING-"));
    }
}
