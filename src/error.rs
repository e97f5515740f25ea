//! Error type shared by every stage of the pipeline.

use std::io;

/// Errors returned by the builder, the validators, the aggregator and
/// the distributed job.
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    /// Reading a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Converting a data frame failed.
    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// A tree or a config could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A setting is out of its range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The data cannot be turned into a sample.
    #[error("invalid sample: {0}")]
    InvalidSample(String),

    /// A tree was asked for zero rows.
    #[error("cannot grow a tree from an empty sample")]
    EmptySample,

    /// An aggregation named a partition that was not declared.
    #[error("partition {index} is out of range (declared {n_partitions} partitions)")]
    UnknownPartition {
        /// The partition named.
        index: usize,
        /// The number of declared partitions.
        n_partitions: usize,
    },

    /// A bad row lies outside its partition.
    #[error("row {row} is out of range for a partition of {n_rows} rows")]
    RowOutOfRange {
        /// The offending row.
        row: usize,
        /// The rows in the partition.
        n_rows: usize,
    },

    /// A bad vote names a class that does not exist.
    #[error("class {class} is out of range ({n_classes} classes)")]
    ClassOutOfRange {
        /// The offending class.
        class: usize,
        /// The number of classes.
        n_classes: usize,
    },

    /// A partition was reported with a new row count.
    #[error("partition {index} was allocated with {expected} rows, got {got}")]
    RowCountMismatch {
        /// The partition.
        index: usize,
        /// The rows it was allocated with.
        expected: usize,
        /// The rows reported now.
        got: usize,
    },

    /// Bad rows and bad votes are not paired up.
    #[error("bad rows and bad votes differ in length ({rows} != {votes})")]
    VoteLengthMismatch {
        /// The number of bad rows.
        rows: usize,
        /// The number of bad votes.
        votes: usize,
    },

    /// A distributed run stopped before every tree was validated.
    #[error("the cluster stopped after {done} of {total} trees")]
    Incomplete {
        /// Trees validated per node.
        done: usize,
        /// Trees expected per node.
        total: usize,
    },

    /// A worker thread panicked.
    #[error("a worker thread panicked: {0}")]
    WorkerPanicked(String),
}

/// Shorthand for results carrying a [`ForestError`].
pub type Result<T> = std::result::Result<T, ForestError>;

/// Maps the payload of a panicked thread into [`ForestError::WorkerPanicked`].
pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> ForestError {
    let message = payload.downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    ForestError::WorkerPanicked(message)
}
