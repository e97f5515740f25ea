use crate::constants::{DEFAULT_MAX_DEPTH, DEFAULT_MIN_SPLIT};
use super::{DecisionTree, Criterion};


/// A struct that builds `DecisionTree`.
/// `DecisionTreeBuilder` keeps parameters for constructing `DecisionTree`.
/// 
/// # Example
/// 
/// ```no_run
/// use miniforest::prelude::*;
/// 
/// let grower = DecisionTreeBuilder::new()
///     .max_depth(8)
///     .criterion(Criterion::Gini)
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct DecisionTreeBuilder {
    max_depth: usize,
    min_split: usize,
    n_features: Option<usize>,
    criterion: Criterion,
}


impl DecisionTreeBuilder {
    /// Construct a new instance of [`DecisionTreeBuilder`].
    /// By default, [`DecisionTreeBuilder`] sets the parameters as follows;
    /// ```text
    /// max_depth: DEFAULT_MAX_DEPTH == 16,
    /// min_split: DEFAULT_MIN_SPLIT == 2,
    /// n_features: None (square root of the number of features),
    /// criterion: Criterion::Gini,
    /// ```
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            min_split: DEFAULT_MIN_SPLIT,
            n_features: None,
            criterion: Criterion::Gini,
        }
    }


    /// Specify the maximal depth of the tree.
    pub fn max_depth(mut self, depth: usize) -> Self {
        assert!(depth > 0, "Tree must have positive depth");
        self.max_depth = depth;

        self
    }


    /// Specify the minimal number of rows a node needs to be split.
    pub fn min_split(mut self, min_split: usize) -> Self {
        assert!(min_split > 1, "A split needs at least two rows");
        self.min_split = min_split;

        self
    }


    /// Specify the number of features tried at each split.
    /// By default, the square root of the number of features is used.
    pub fn features_per_split(mut self, n_features: usize) -> Self {
        assert!(n_features > 0, "A split needs at least one feature");
        self.n_features = Some(n_features);

        self
    }


    /// Set the node splitting rule.
    /// Default value is `Criterion::Gini`.
    #[inline]
    pub fn criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }


    /// Build a `DecisionTree`.
    /// This method consumes `self`.
    pub fn build(self) -> DecisionTree {
        DecisionTree::from_components(
            self.criterion,
            self.max_depth,
            self.min_split,
            self.n_features,
        )
    }
}


impl Default for DecisionTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
