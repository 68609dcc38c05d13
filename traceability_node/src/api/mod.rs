//! HTTP surface of the node.
//!
//! Routes mirror the network's conventional layout: `/api/tracking/*`
//! for consumer queries and `/api/blockchain/*` for the write path and
//! raw reads. Authentication is a deployment concern handled in front
//! of the node, not here.

pub mod errors;
pub mod handlers;
pub mod server;

pub use errors::{ApiError, ApiResult};
pub use server::{build_router, ApiServer, AppState};
