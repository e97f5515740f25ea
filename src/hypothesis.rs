//! The core library for `Classifier` trait and the majority-vote forest.

pub(crate) mod classifier;
pub(crate) mod random_forest;


pub use classifier::Classifier;
pub use random_forest::RandomForest;
