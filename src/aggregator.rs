//! Incremental majority-vote accounting.
//!
//! The aggregator never re-scores a tree.
//! Each tree contributes its misclassified rows once,
//! and the ensemble error is read off the accumulated vote counts.

mod partition;
mod row_errors;

pub use row_errors::{max_bad, RowErrorCounts};

use partition::Partition;

use crate::{
    director::AggregationObserver,
    ForestError,
    RandomForest,
    Result,
};

use std::collections::HashSet;
use std::sync::Arc;


/// The trees aggregated so far, in arrival order.
/// Two trees are the same iff they share an `Arc` allocation.
#[derive(Debug)]
struct TreeSet<T> {
    trees: Vec<Arc<T>>,
    seen: HashSet<usize>,
}


impl<T> TreeSet<T> {
    fn new() -> Self {
        Self { trees: Vec::new(), seen: HashSet::new() }
    }


    #[inline]
    fn contains(&self, tree: &Arc<T>) -> bool {
        self.seen.contains(&address(tree))
    }


    fn insert(&mut self, tree: &Arc<T>) -> bool {
        let fresh = self.seen.insert(address(tree));
        if fresh {
            self.trees.push(Arc::clone(tree));
        }
        fresh
    }


    #[inline]
    fn len(&self) -> usize {
        self.trees.len()
    }
}


#[inline(always)]
fn address<T>(tree: &Arc<T>) -> usize {
    Arc::as_ptr(tree) as usize
}


/// Accumulates, per data partition,
/// how many trees voted each row into each wrong class.
///
/// A row is misclassified by the ensemble iff
/// the trees voting for its true class do not strictly outnumber
/// the most popular wrong class.
///
/// # Example
/// ```
/// use miniforest::prelude::*;
/// use std::sync::Arc;
///
/// # struct Stub;
/// # impl Classifier for Stub {
/// #     fn predict(&self, _: &Sample, _: usize) -> usize { 0 }
/// # }
/// let mut aggregator = Aggregator::new(1, 3);
/// let tree = Arc::new(Stub);
/// aggregator.aggregate(0, &tree, 4, &[1, 2], &[2, 0]).unwrap();
///
/// assert_eq!(aggregator.n_trees(), 1);
/// assert_eq!(aggregator.error(), 0.5);
/// ```
pub struct Aggregator<T> {
    trees: TreeSet<T>,
    partitions: Vec<Option<Partition>>,
    n_classes: usize,
    total_rows: usize,
    observer: Option<Box<dyn AggregationObserver + Send + Sync>>,
}


impl<T> Aggregator<T> {
    /// Construct an aggregator for `n_partitions` data partitions
    /// of a problem with `n_classes` classes.
    pub fn new(n_partitions: usize, n_classes: usize) -> Self {
        assert!(n_classes > 0, "the number of classes must be positive");
        Self {
            trees: TreeSet::new(),
            partitions: (0..n_partitions).map(|_| None).collect(),
            n_classes,
            total_rows: 0,
            observer: None,
        }
    }


    /// Notify `observer` after every change.
    pub fn observer<O>(mut self, observer: O) -> Self
        where O: AggregationObserver + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }


    /// Returns the number of distinct trees aggregated so far.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }


    /// Returns the number of classes.
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }


    /// Returns the number of rows over all allocated partitions.
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }


    /// Returns `true` if `tree` has been aggregated.
    pub fn contains(&self, tree: &Arc<T>) -> bool {
        self.trees.contains(tree)
    }


    /// Fold the validation outcome of `tree` on `partition` into the vote
    /// counts.
    ///
    /// `n_rows` is the row count of the partition,
    /// `bad_rows[i]` a row `tree` got wrong and
    /// `bad_votes[i]` the class it predicted for that row.
    ///
    /// Returns `Ok(false)` without touching anything
    /// if `tree` was already aggregated.
    /// Every argument is checked before the first count changes,
    /// so an `Err` leaves the aggregator as it was.
    pub fn aggregate(
        &mut self,
        partition: usize,
        tree: &Arc<T>,
        n_rows: usize,
        bad_rows: &[usize],
        bad_votes: &[usize],
    ) -> Result<bool>
    {
        let n_partitions = self.partitions.len();
        if partition >= n_partitions {
            return Err(ForestError::UnknownPartition {
                index: partition, n_partitions,
            });
        }
        if bad_rows.len() != bad_votes.len() {
            return Err(ForestError::VoteLengthMismatch {
                rows: bad_rows.len(), votes: bad_votes.len(),
            });
        }
        if self.trees.contains(tree) {
            return Ok(false);
        }
        self.check_votes(partition, n_rows, bad_rows, bad_votes)?;

        self.trees.insert(tree);

        if !bad_rows.is_empty() {
            let n_classes = self.n_classes;
            let slot = &mut self.partitions[partition];
            if slot.is_none() {
                self.total_rows += n_rows;
                log::debug!("allocated partition {partition} ({n_rows} rows)");
            }
            let votes = slot.get_or_insert_with(|| {
                Partition::new(n_rows, n_classes)
            });
            bad_rows.iter()
                .zip(bad_votes)
                .for_each(|(&row, &class)| votes.add(row, class));
        }

        if let Some(observer) = &self.observer {
            observer.on_aggregator_change(self.n_trees(), self.error());
        }
        Ok(true)
    }


    fn check_votes(
        &self,
        partition: usize,
        n_rows: usize,
        bad_rows: &[usize],
        bad_votes: &[usize],
    ) -> Result<()>
    {
        if let Some(votes) = &self.partitions[partition] {
            if votes.n_rows() != n_rows {
                return Err(ForestError::RowCountMismatch {
                    index: partition,
                    expected: votes.n_rows(),
                    got: n_rows,
                });
            }
        }
        if let Some(&row) = bad_rows.iter().find(|&&r| r >= n_rows) {
            return Err(ForestError::RowOutOfRange { row, n_rows });
        }
        let n_classes = self.n_classes;
        if let Some(&class) = bad_votes.iter().find(|&&c| c >= n_classes) {
            return Err(ForestError::ClassOutOfRange { class, n_classes });
        }
        Ok(())
    }


    /// Returns the number of rows the majority vote gets wrong,
    /// over all allocated partitions.
    pub fn bad_row_count(&self) -> usize {
        let n_trees = self.n_trees();
        self.partitions.iter()
            .flatten()
            .map(|votes| votes.bad_rows(n_trees))
            .sum()
    }


    /// Returns the majority-vote error over all allocated partitions,
    /// or `-1.0` if no tree has made a mistake yet.
    pub fn error(&self) -> f64 {
        if self.total_rows == 0 { return -1f64; }
        self.bad_row_count() as f64 / self.total_rows as f64
    }
}


impl<T> Aggregator<T> {
    /// Returns the forest of every tree aggregated so far,
    /// in arrival order.
    pub fn forest(&self) -> RandomForest<T> {
        RandomForest::new(self.trees.trees.clone(), self.n_classes)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Classifier, Sample};
    use std::sync::Mutex;

    struct Stub;
    impl Classifier for Stub {
        fn predict(&self, _: &Sample, _: usize) -> usize { 0 }
    }

    struct Recorder(Arc<Mutex<Vec<(usize, f64)>>>);
    impl AggregationObserver for Recorder {
        fn on_aggregator_change(&self, n_trees: usize, error: f64) {
            self.0.lock().unwrap().push((n_trees, error));
        }
    }

    fn trees(n: usize) -> Vec<Arc<Stub>> {
        (0..n).map(|_| Arc::new(Stub)).collect()
    }

    #[test]
    fn test_majority_error_01() {
        // 10 rows, 3 classes, 3 trees.
        // Row 0: two trees vote class 1 -> bad.
        // Row 1: one vote each for classes 1 and 2 -> bad (tie with good).
        // Row 2: a single wrong vote -> good.
        let mut agg = Aggregator::new(1, 3);
        let ts = trees(3);
        agg.aggregate(0, &ts[0], 10, &[0, 1, 2], &[1, 1, 2]).unwrap();
        agg.aggregate(0, &ts[1], 10, &[0, 1], &[1, 2]).unwrap();
        agg.aggregate(0, &ts[2], 10, &[], &[]).unwrap();

        assert_eq!(agg.n_trees(), 3);
        assert_eq!(agg.bad_row_count(), 2);
        let res = agg.error();
        assert_eq!(res, 0.2, "expected 0.2, got {res}.");
    }

    #[test]
    fn test_single_bad_row_02() {
        let mut agg = Aggregator::new(1, 3);
        let ts = trees(3);
        agg.aggregate(0, &ts[0], 10, &[4], &[2]).unwrap();
        agg.aggregate(0, &ts[1], 10, &[4], &[1]).unwrap();
        agg.aggregate(0, &ts[2], 10, &[], &[]).unwrap();
        let res = agg.error();
        assert_eq!(res, 0.1, "expected 0.1, got {res}.");
    }

    #[test]
    fn test_even_tie_03() {
        let mut agg = Aggregator::new(1, 2);
        let ts = trees(2);
        agg.aggregate(0, &ts[0], 4, &[0], &[1]).unwrap();
        agg.aggregate(0, &ts[1], 4, &[], &[]).unwrap();
        let res = agg.error();
        assert_eq!(res, 0.25, "a 1-1 tie must count as bad, got {res}.");
    }

    #[test]
    fn test_idempotence_04() {
        let mut agg = Aggregator::new(2, 2);
        let ts = trees(1);
        assert!(agg.aggregate(1, &ts[0], 5, &[0, 3], &[1, 1]).unwrap());
        let before = agg.error();
        assert!(!agg.aggregate(1, &ts[0], 5, &[0, 3], &[1, 1]).unwrap());
        assert_eq!(agg.n_trees(), 1);
        assert_eq!(agg.error(), before);
    }

    #[test]
    fn test_no_data_05() {
        let mut agg = Aggregator::<Stub>::new(3, 2);
        assert_eq!(agg.error(), -1.0);
        agg.aggregate(0, &Arc::new(Stub), 5, &[], &[]).unwrap();
        assert_eq!(agg.n_trees(), 1);
        assert_eq!(agg.error(), -1.0);
        assert_eq!(agg.bad_row_count(), 0);
    }

    #[test]
    fn test_invariant_violations_06() {
        let mut agg = Aggregator::new(1, 2);
        let ts = trees(2);
        let res = agg.aggregate(1, &ts[0], 5, &[0], &[1]);
        assert!(matches!(res, Err(ForestError::UnknownPartition { .. })));
        let res = agg.aggregate(0, &ts[0], 5, &[5], &[1]);
        assert!(matches!(res, Err(ForestError::RowOutOfRange { .. })));
        let res = agg.aggregate(0, &ts[0], 5, &[0], &[2]);
        assert!(matches!(res, Err(ForestError::ClassOutOfRange { .. })));
        let res = agg.aggregate(0, &ts[0], 5, &[0, 1], &[1]);
        assert!(matches!(res, Err(ForestError::VoteLengthMismatch { .. })));
        assert_eq!(agg.n_trees(), 0, "a rejected tree must not be counted.");

        agg.aggregate(0, &ts[0], 5, &[0], &[1]).unwrap();
        let res = agg.aggregate(0, &ts[1], 6, &[0], &[1]);
        assert!(matches!(res, Err(ForestError::RowCountMismatch { .. })));
    }

    #[test]
    fn test_observer_07() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut agg = Aggregator::new(1, 2)
            .observer(Recorder(Arc::clone(&seen)));
        let ts = trees(2);
        agg.aggregate(0, &ts[0], 2, &[0], &[1]).unwrap();
        agg.aggregate(0, &ts[0], 2, &[0], &[1]).unwrap();
        agg.aggregate(0, &ts[1], 2, &[], &[]).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![(1, 0.5), (2, 0.5)], "got {seen:?}.");
    }

    #[test]
    fn test_forest_08() {
        let mut agg = Aggregator::new(1, 2);
        let ts = trees(3);
        for t in &ts {
            agg.aggregate(0, t, 2, &[], &[]).unwrap();
        }
        let forest = agg.forest();
        assert_eq!(forest.len(), 3);
        assert!(Arc::ptr_eq(&forest.trees()[1], &ts[1]));
    }

    #[test]
    fn test_row_count_without_mistakes_09() {
        let mut agg = Aggregator::new(1, 2);
        let ts = trees(3);
        agg.aggregate(0, &ts[0], 5, &[1], &[1]).unwrap();

        let res = agg.aggregate(0, &ts[1], 9, &[], &[]);
        assert!(matches!(res, Err(ForestError::RowCountMismatch { .. })));
        assert_eq!(agg.n_trees(), 1);

        assert!(agg.aggregate(0, &ts[2], 5, &[], &[]).unwrap());
        assert_eq!(agg.n_trees(), 2);
    }
}
