//! Binds builder, validator and aggregator into a pipeline.
//!
//! Each stage only talks to the observer it was started with.
//! [`LocalForest`] wires the three stages in one process;
//! the distributed wiring lives in [`crate::distributed`].

mod config;
mod local;
mod observer;

pub use config::ForestConfig;
pub use local::{LocalForest, ForestReport};
pub use observer::{
    AggregationObserver,
    BuildObserver,
    ValidationObserver,
};

pub(crate) use config::invalid;
