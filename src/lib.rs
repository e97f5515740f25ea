#![warn(missing_docs)]

//!
//! A crate that grows random forests and validates them incrementally.
//!
//! Trees are grown by builder threads, scored once each on held-out data,
//! and folded into per-row vote counts,
//! so the majority-vote error of the whole forest is available
//! after every tree without re-scoring the trees seen before.
//!
//! The pipeline runs in two flavors.
//!
//! - [`LocalForest`]
//!     Builder threads hand trees to validator threads through a queue,
//!     in a single process.
//!
//! - [`DistributedForest`]
//!     Every node grows its own trees and publishes them
//!     to a shared [`KeyValueStore`](distributed::KeyValueStore).
//!     Every node validates every tree on its own held-out rows
//!     and publishes its error history,
//!     which a monitor merges into one global error.
//!
//! # Example
//! ```no_run
//! use miniforest::prelude::*;
//! use polars::prelude::*;
//!
//! let df = CsvReader::from_path("/path/to/data.csv")
//!     .unwrap()
//!     .has_header(true)
//!     .finish()
//!     .unwrap();
//! let target = df.column("class").unwrap().clone();
//! let data = df.drop("class").unwrap();
//! let sample = Sample::from_dataframe(data, &target).unwrap();
//!
//! let (train, valid) = sample.split_holdout(3);
//! let grower = DecisionTreeBuilder::new()
//!     .max_depth(10)
//!     .criterion(Criterion::Entropy)
//!     .build();
//!
//! let report = LocalForest::new(grower)
//!     .config(ForestConfig::new().n_trees(100).builder_threads(4))
//!     .reporter(ConsoleReporter::default())
//!     .run(&train, &valid)
//!     .unwrap();
//!
//! println!("validation error: {}", report.error);
//! ```

pub mod common;
pub(crate) mod constants;
pub mod error;

pub mod sample;
pub mod hypothesis;
pub mod learner;

pub mod builder;
pub mod validator;
pub mod aggregator;
pub mod director;
pub mod distributed;

/// Exports the standard pieces of the pipeline.
pub mod prelude;


pub use error::{ForestError, Result};

pub use sample::{Sample, DenseFeature};

pub use hypothesis::{Classifier, RandomForest};

pub use learner::{
    TreeGrower,
    Criterion,
    DecisionTree,
    DecisionTreeBuilder,
    DecisionTreeClassifier,
};

pub use builder::TreeBuilder;
pub use validator::{Validator, Work, Score};
pub use aggregator::{Aggregator, RowErrorCounts};

pub use director::{
    AggregationObserver,
    BuildObserver,
    ValidationObserver,
    ForestConfig,
    ForestReport,
    LocalForest,
};

pub use distributed::{
    ClusterConfig,
    ClusterReport,
    DistributedForest,
};

pub use common::{
    Reporter,
    ConsoleReporter,
    LogReporter,
    SilentReporter,
};
