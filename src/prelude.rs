//! Exports the standard pipeline, tree grower and traits.
//!
pub use crate::{
    // Data ---------------------------------------
    Sample,


    // Trees --------------------------------------
    TreeGrower,
    Classifier,
    RandomForest,

    DecisionTree,
    DecisionTreeBuilder,
    DecisionTreeClassifier,
    Criterion,


    // Pipeline -----------------------------------
    TreeBuilder,
    Validator,
    Aggregator,
    RowErrorCounts,

    LocalForest,
    ForestConfig,
    ForestReport,

    DistributedForest,
    ClusterConfig,
    ClusterReport,


    // Output -------------------------------------
    Reporter,
    ConsoleReporter,
    LogReporter,
    SilentReporter,


    ForestError,
};

pub use crate::distributed::{
    KeyValueStore,
    InMemoryCloud,
};
