use rand::rngs::StdRng;
use rand::seq::index;

use crate::{ForestError, Result, Sample, TreeGrower};
use super::{
    node::*,
    criterion::*,
    dtree_classifier::DecisionTreeClassifier,
};

use std::fmt;


/// The randomized decision tree grower used by the forest.
/// Given rows of a training sample, [`DecisionTree`] grows
/// a multi-class [`DecisionTreeClassifier`].
/// At each node, only a random subset of the features is searched,
/// so that two trees grown from the same rows still differ.
///
/// [`DecisionTree`] is constructed
/// by [`DecisionTreeBuilder`](super::DecisionTreeBuilder).
///
/// # Example
/// ```no_run
/// use miniforest::prelude::*;
/// use rand::prelude::*;
///
/// # let sample: Sample = unimplemented!();
/// let grower = DecisionTreeBuilder::new()
///     .max_depth(4)
///     .build();
///
/// let n_sample = sample.shape().0;
/// let rows = (0..n_sample).collect::<Vec<_>>();
/// let mut rng = StdRng::seed_from_u64(0);
/// let f = grower.grow(&sample, &rows, &mut rng).unwrap();
/// println!("training error: {}", f.error_rate(&sample));
/// ```
#[derive(Clone, Debug)]
pub struct DecisionTree {
    criterion: Criterion,
    max_depth: usize,
    min_split: usize,
    n_features: Option<usize>,
}


impl DecisionTree {
    /// Initialize [`DecisionTree`].
    /// This method is called only via `DecisionTreeBuilder::build`.
    #[inline]
    pub(super) fn from_components(
        criterion: Criterion,
        max_depth: usize,
        min_split: usize,
        n_features: Option<usize>,
    ) -> Self
    {
        Self { criterion, max_depth, min_split, n_features, }
    }


    /// Returns the number of features searched per split.
    fn features_per_split(&self, n_feature: usize) -> usize {
        self.n_features
            .unwrap_or_else(|| (n_feature as f64).sqrt().ceil() as usize)
            .clamp(1, n_feature)
    }


    /// Grow the subtree for `rows`.
    fn full_tree(
        &self,
        sample: &Sample,
        rows: Vec<usize>,
        depth: usize,
        rng: &mut StdRng,
    ) -> Node
    {
        let counts = class_counts(sample, &rows);
        let class = majority(&counts);

        let impurity = self.criterion.impurity(&counts);
        if impurity == 0f64 || depth < 1 || rows.len() < self.min_split {
            return Node::leaf(class);
        }


        let n_feature = sample.shape().1;
        let k = self.features_per_split(n_feature);
        let features = index::sample(rng, n_feature, k).into_vec();


        // If no feature separates the rows, construct a leaf node.
        let split = match self.criterion.best_split(sample, &rows, &features) {
            Some(split) => split,
            None => return Node::leaf(class),
        };


        let mut lrows = Vec::new();
        let mut rrows = Vec::new();
        for i in rows {
            if sample.value(split.feature, i) < split.threshold {
                lrows.push(i);
            } else {
                rrows.push(i);
            }
        }


        // If the split has no meaning, construct a leaf node.
        if lrows.is_empty() || rrows.is_empty() {
            return Node::leaf(class);
        }

        let depth = depth - 1;
        let ltree = self.full_tree(sample, lrows, depth, rng);
        let rtree = self.full_tree(sample, rrows, depth, rng);

        Node::branch(split.feature, split.threshold, ltree, rtree)
    }
}


impl TreeGrower for DecisionTree {
    type Tree = DecisionTreeClassifier;


    fn name(&self) -> &str {
        "Decision Tree"
    }


    fn info(&self) -> Option<Vec<(&str, String)>> {
        let n_features = self.n_features
            .map(|k| k.to_string())
            .unwrap_or_else(|| "sqrt".to_string());
        let info = Vec::from([
            ("Max depth", format!("{}", self.max_depth)),
            ("Min split", format!("{}", self.min_split)),
            ("Features per split", n_features),
            ("Split criterion", format!("{}", self.criterion)),
        ]);
        Some(info)
    }


    fn grow(&self, sample: &Sample, rows: &[usize], rng: &mut StdRng)
        -> Result<Self::Tree>
    {
        let (n_sample, n_feature) = sample.shape();
        if rows.is_empty() || n_sample == 0 || n_feature == 0 {
            return Err(ForestError::EmptySample);
        }
        if let Some(&row) = rows.iter().find(|&&i| i >= n_sample) {
            return Err(ForestError::RowOutOfRange { row, n_rows: n_sample });
        }

        let root = self.full_tree(sample, rows.to_vec(), self.max_depth, rng);
        Ok(DecisionTreeClassifier::from(root))
    }
}


/// Returns the number of rows of each class.
#[inline]
fn class_counts(sample: &Sample, rows: &[usize]) -> Vec<f64> {
    let target = sample.target();
    let mut counts = vec![0f64; sample.n_classes()];
    rows.iter().for_each(|&i| counts[target[i]] += 1f64);
    counts
}


/// Returns the first class with the largest count.
#[inline]
fn majority(counts: &[f64]) -> usize {
    let mut best = 0;
    for (class, &c) in counts.iter().enumerate().skip(1) {
        if c > counts[best] { best = class; }
    }
    best
}


impl fmt::Display for DecisionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\
            ----------\n\
            # Decision Tree\n\n\
            - Max depth: {}\n\
            - Min split: {}\n\
            - Splitting criterion: {}\n\
            ----------\
            ",
            self.max_depth,
            self.min_split,
            self.criterion,
        )
    }
}
