use miniforest::prelude::*;
use miniforest::{ForestError, Result};

use rand::rngs::StdRng;

use std::sync::atomic::{AtomicUsize, Ordering};


/// 120 rows on a 12 x 10 grid, three classes,
/// plus one feature that carries no signal.
fn grid_sample() -> Sample {
    let n = 120;
    let x = (0..n).map(|i| (i % 12) as f64).collect::<Vec<_>>();
    let y = (0..n).map(|i| (i / 12) as f64).collect::<Vec<_>>();
    let z = (0..n).map(|i| ((i * 7) % 13) as f64).collect::<Vec<_>>();
    let target = x.iter().zip(&y)
        .map(|(&x, &y)| if x < 6.0 { 0 } else if y < 5.0 { 1 } else { 2 })
        .collect::<Vec<_>>();
    Sample::from_columns(vec![("x", x), ("y", y), ("z", z)], target).unwrap()
}


/// Fails on its third tree.
struct Failing {
    inner: DecisionTree,
    calls: AtomicUsize,
}

impl TreeGrower for Failing {
    type Tree = DecisionTreeClassifier;

    fn name(&self) -> &str { "Failing" }

    fn grow(&self, sample: &Sample, rows: &[usize], rng: &mut StdRng)
        -> Result<Self::Tree>
    {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 2 {
            return Err(ForestError::EmptySample);
        }
        self.inner.grow(sample, rows, rng)
    }
}


/// Tests for `LocalForest`.
#[cfg(test)]
pub mod local_forest_tests {
    use super::*;

    #[test]
    fn test_run_01() {
        let sample = grid_sample();
        let (train, valid) = sample.split_holdout(3);
        let grower = DecisionTreeBuilder::new()
            .max_depth(4)
            .build();
        let config = ForestConfig::new()
            .n_trees(12)
            .builder_threads(3)
            .validator_threads(2)
            .sample_ratio(0.8);

        let report = LocalForest::new(grower)
            .config(config)
            .run(&train, &valid)
            .unwrap();

        assert_eq!(report.forest.len(), 12);
        assert_eq!(report.history.len(), 12);
        assert_eq!(report.tree_errors.len(), 12);
        assert!((0.0..=1.0).contains(&report.error), "got {}.", report.error);
        assert_eq!(report.history.last().copied(), Some(report.error));

        // Ties count as mistakes for the aggregator but not for the forest.
        let res = report.forest.error_rate(&valid);
        assert!(res <= report.error, "forest {res} > aggregated {}.", report.error);
        assert!(report.error < 0.5, "the grid is easy; got {}.", report.error);
    }

    #[test]
    fn test_single_thread_is_reproducible_02() {
        let sample = grid_sample();
        let (train, valid) = sample.split_holdout(4);
        let config = ForestConfig::new()
            .n_trees(5)
            .builder_threads(1)
            .validator_threads(1)
            .sample_ratio(0.5)
            .seed(7);

        let run = || {
            let grower = DecisionTreeBuilder::new().max_depth(3).build();
            LocalForest::new(grower)
                .config(config.clone())
                .reporter(LogReporter)
                .run(&train, &valid)
                .unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.tree_errors, b.tree_errors);
        assert_eq!(a.history, b.history);
    }

    #[test]
    fn test_grower_failure_03() {
        let sample = grid_sample();
        let (train, valid) = sample.split_holdout(3);
        let grower = Failing {
            inner: DecisionTreeBuilder::new().max_depth(2).build(),
            calls: AtomicUsize::new(0),
        };
        let config = ForestConfig::new().n_trees(10).builder_threads(1);

        let res = LocalForest::new(grower).config(config).run(&train, &valid);
        assert!(matches!(res, Err(ForestError::EmptySample)), "got {res:?}.");
    }

    #[test]
    fn test_invalid_config_04() {
        let sample = grid_sample();
        let (train, valid) = sample.split_holdout(3);
        let grower = DecisionTreeBuilder::new().build();
        let config = ForestConfig::new().builder_threads(0);

        let res = LocalForest::new(grower).config(config).run(&train, &valid);
        assert!(matches!(res, Err(ForestError::InvalidConfig(_))));
    }
}
