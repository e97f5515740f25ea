//! The files in `learner/` directory defines
//! `TreeGrower` trait and the tree growers.

/// Provides TreeGrower trait.
pub mod core;

/// Defines Decision Tree.
pub mod decision_tree;


pub use self::core::TreeGrower;

pub use self::decision_tree::{
    Criterion,
    DecisionTree,
    DecisionTreeBuilder,
    DecisionTreeClassifier,
};
