//! The distributed pipeline.
//!
//! Nodes never call each other.
//! They only share an addressed [`KeyValueStore`]:
//! builders publish trees under well-known keys,
//! validators poll for them and publish their error histories,
//! and a single [`ProgressMonitor`] polls the histories.

mod config;
mod job;
mod monitor;
mod polling_validator;
mod publisher;
mod result_slot;
mod store;

pub use config::ClusterConfig;
pub use job::{ClusterReport, DistributedForest};
pub use monitor::{ProgressMonitor, ProgressState};
pub use polling_validator::PollingValidator;
pub use publisher::TreePublisher;
pub use result_slot::ResultSlot;
pub use store::{
    error_key,
    tree_key,
    InMemoryCloud,
    KeyValueStore,
    NodeStore,
};
