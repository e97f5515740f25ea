use serde::{Serialize, Deserialize};

use crate::{Classifier, Sample};

use std::sync::Arc;


/// The ensemble returned by the pipeline.
/// Each tree casts one vote; the class with the most votes wins,
/// and ties go to the smallest class index.
///
/// You can read/write this struct by `Serde` trait.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RandomForest<T> {
    trees: Vec<Arc<T>>,
    n_classes: usize,
}


impl<T> RandomForest<T> {
    /// Construct a new `RandomForest` from the given trees.
    pub fn new(trees: Vec<Arc<T>>, n_classes: usize) -> Self {
        Self { trees, n_classes }
    }


    /// Returns the trees of this forest.
    pub fn trees(&self) -> &[Arc<T>] {
        &self.trees[..]
    }


    /// Returns the number of trees.
    pub fn len(&self) -> usize {
        self.trees.len()
    }


    /// Returns `true` if the forest has no tree.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }


    /// Returns the number of classes the forest votes over.
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}


impl<T: Classifier> RandomForest<T> {
    /// Returns the vote counts of each class for the i'th row of `sample`.
    pub fn votes(&self, sample: &Sample, row: usize) -> Vec<usize> {
        let mut votes = vec![0_usize; self.n_classes];
        for tree in self.trees.iter() {
            let class = tree.predict(sample, row);
            if let Some(v) = votes.get_mut(class) {
                *v += 1;
            }
        }
        votes
    }
}


impl<T: Classifier> Classifier for RandomForest<T> {
    fn predict(&self, sample: &Sample, row: usize) -> usize {
        let votes = self.votes(sample, row);
        let mut best = 0;
        for (class, &v) in votes.iter().enumerate().skip(1) {
            if v > votes[best] { best = class; }
        }
        best
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(usize);

    impl Classifier for Constant {
        fn predict(&self, _sample: &Sample, _row: usize) -> usize {
            self.0
        }
    }

    fn sample() -> Sample {
        Sample::from_columns(vec![("x", vec![0.0, 1.0])], vec![0, 2])
            .unwrap()
    }

    #[test]
    fn test_majority_01() {
        let trees = vec![Constant(1), Constant(2), Constant(2)]
            .into_iter()
            .map(Arc::new)
            .collect::<Vec<_>>();
        let forest = RandomForest::new(trees, 3);
        let res = forest.predict(&sample(), 0);
        assert_eq!(res, 2, "expected class 2, got {res}.");
    }

    #[test]
    fn test_tie_goes_to_first_max_02() {
        let trees = vec![Constant(2), Constant(1)]
            .into_iter()
            .map(Arc::new)
            .collect::<Vec<_>>();
        let forest = RandomForest::new(trees, 3);
        let res = forest.predict(&sample(), 0);
        assert_eq!(res, 1, "expected class 1, got {res}.");
    }

    #[test]
    fn test_error_rate_03() {
        let forest = RandomForest::new(vec![Arc::new(Constant(0))], 3);
        let res = forest.error_rate(&sample());
        assert_eq!(res, 0.5, "expected 0.5, got {res}.");
    }
}
