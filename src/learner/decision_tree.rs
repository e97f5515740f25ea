/// Defines the decision tree grower.
pub mod dtree;
/// Defines the classifier produced by `DecisionTree`.
pub mod dtree_classifier;
/// Defines the builder of `DecisionTree`.
pub mod builder;

/// Defines the inner representations of `DecisionTreeClassifier`.
mod node;
mod criterion;


pub use dtree_classifier::DecisionTreeClassifier;
pub use dtree::DecisionTree;
pub use builder::DecisionTreeBuilder;
pub use criterion::Criterion;
