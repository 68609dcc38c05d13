//! HerbionYX traceability node.
//!
//! Records provenance events for Ayurvedic herb batches against a
//! pluggable chain backend, pins event metadata to a content-addressed
//! store, and reconstructs the provenance tree, trail, and statistics
//! for consumer-facing queries.
//!
//! The heart of the crate is [`provenance`], a pure engine over one
//! batch's event snapshot. [`chain`], [`ipfs`], and [`identity`] wrap
//! the external collaborators behind traits; [`tracking`] composes them
//! into the reporting layer; [`api`] exposes everything over HTTP.

pub mod api;
pub mod chain;
pub mod config;
pub mod identity;
pub mod ipfs;
pub mod provenance;
pub mod tracking;
pub mod types;
pub mod utils;

pub use chain::{ChainClient, ChainError};
pub use config::AppConfig;
pub use ipfs::{IpfsError, MetadataStore};
pub use provenance::{build_tree, compute_statistics, find_path, Statistics, TreeNode};
pub use tracking::TrackingService;
pub use types::{Batch, Event, EventType};
