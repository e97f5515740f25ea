use miniforest::prelude::*;
use miniforest::distributed::{
    error_key,
    tree_key,
    NodeStore,
    PollingValidator,
    ProgressMonitor,
    ResultSlot,
    TreePublisher,
};
use miniforest::common::Signal;
use miniforest::BuildObserver;

use rand::prelude::*;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;


fn grid_sample() -> Sample {
    let n = 90;
    let x = (0..n).map(|i| (i % 9) as f64).collect::<Vec<_>>();
    let y = (0..n).map(|i| (i / 9) as f64).collect::<Vec<_>>();
    let target = x.iter().zip(&y)
        .map(|(&x, &y)| usize::from(x + y > 8.0))
        .collect::<Vec<_>>();
    Sample::from_columns(vec![("x", x), ("y", y)], target).unwrap()
}


/// Misses the first read of every key.
struct Flaky {
    inner: NodeStore,
    seen: Mutex<HashSet<String>>,
    misses: AtomicUsize,
}

impl Flaky {
    fn new(inner: NodeStore) -> Self {
        Self {
            inner,
            seen: Mutex::new(HashSet::new()),
            misses: AtomicUsize::new(0),
        }
    }
}

impl KeyValueStore for Flaky {
    fn put(&self, key: &str, value: Arc<[u8]>) {
        self.inner.put(key, value);
    }

    fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        let first = self.seen.lock().unwrap().insert(key.to_string());
        if first {
            self.misses.fetch_add(1, Ordering::SeqCst);
            return None;
        }
        self.inner.get(key)
    }

    fn is_home(&self, key: &str) -> bool {
        self.inner.is_home(key)
    }

    fn free(&self, key: &str) {
        self.inner.free(key);
    }
}


/// Tests for the distributed pipeline.
#[cfg(test)]
pub mod distributed_tests {
    use super::*;

    #[test]
    fn test_two_nodes_five_trees_01() {
        let sample = grid_sample();
        let cloud = InMemoryCloud::new(2);
        let flaky = cloud.nodes()
            .into_iter()
            .map(|node| Arc::new(Flaky::new(node)))
            .collect::<Vec<_>>();
        let stores = flaky.iter()
            .map(|store| Arc::clone(store) as Arc<dyn KeyValueStore>)
            .collect::<Vec<_>>();
        let config = ClusterConfig::new()
            .n_nodes(2)
            .trees_per_node(5)
            .poll_interval(Duration::from_millis(1))
            .monitor_interval(Duration::from_millis(1));
        let grower = DecisionTreeBuilder::new().max_depth(3).build();

        let report = DistributedForest::new(grower)
            .config(config)
            .stores(stores)
            .run(&sample)
            .unwrap();

        assert_eq!(report.n_trees_computed, 10);
        assert_eq!(report.forest.len(), 10);
        assert_eq!(report.history.len(), 10);
        assert_eq!(report.node_errors.len(), 2);
        assert!((0.0..=1.0).contains(&report.error), "got {}.", report.error);
        assert_eq!(report.history.last().copied(), Some(report.error));

        // Ten trees and one result slot per node.
        assert_eq!(cloud.len(), 10 + 2);
        let misses = flaky.iter()
            .map(|store| store.misses.load(Ordering::SeqCst))
            .sum::<usize>();
        assert!(misses > 0, "the run must have gone through read misses.");
    }

    #[test]
    fn test_polling_validator_02() {
        let sample = grid_sample();
        let (train, valid) = sample.split_holdout(3);
        let cloud = InMemoryCloud::new(2);
        let node = Arc::new(cloud.node(0));
        let store: Arc<dyn KeyValueStore> = node.clone();

        let grower = DecisionTreeBuilder::new().max_depth(2).build();
        let mut rng = StdRng::seed_from_u64(0);
        let rows = (0..train.shape().0).collect::<Vec<_>>();
        for builder in 0..2 {
            let publisher = TreePublisher::new(
                Arc::new(cloud.node(builder)),
                builder,
                "T_",
                Arc::new(SilentReporter),
            );
            for _ in 0..3 {
                let tree = grower.grow(&train, &rows, &mut rng).unwrap();
                publisher.on_tree_built(Arc::new(tree)).unwrap();
            }
            assert_eq!(publisher.published(), 3);
        }
        assert!(cloud.node(1).get(&tree_key("T_", 1, 2)).is_some());

        let mut validator = PollingValidator::<DecisionTreeClassifier>::new(
                0, 2, 3, store, Arc::new(valid.clone()), "T_",
            )
            .poll_interval(Duration::from_millis(1));
        validator.run(&Signal::new()).unwrap();

        assert_eq!(validator.n_validated(), 6);
        assert_eq!(validator.forest().len(), 6);
        assert_eq!(node.n_replicas(), 0, "every fetched replica is freed.");

        let bytes = node.get(&error_key("T_", 0)).unwrap();
        let slot = ResultSlot::from_bytes(&bytes).unwrap();
        assert_eq!(slot.trees_validated, 6);
        assert_eq!(slot.n_rows, valid.shape().0 as u64);
        assert_eq!(slot.errors.len(), 6);
    }

    #[test]
    fn test_monitor_never_regresses_03() {
        let cloud = InMemoryCloud::new(2);
        let nodes = cloud.nodes();
        let store: Arc<dyn KeyValueStore> = Arc::new(cloud.node(0));
        let mut monitor = ProgressMonitor::new(store, "M_", 2, 2);

        let slot = |errors: &[u64]| ResultSlot {
            trees_validated: errors.len() as u32,
            n_rows: 10,
            errors: errors.to_vec(),
        };
        nodes[0].put(&error_key("M_", 0), slot(&[5, 3]).to_bytes().into());
        assert!(monitor.poll_once());
        assert_eq!(monitor.state().processed(0), 2);
        assert_eq!(monitor.state().n_trees_computed(), 1);
        assert!(!monitor.is_done());

        // A stale slot and a truncated slot change nothing.
        nodes[0].put(&error_key("M_", 0), slot(&[5]).to_bytes().into());
        assert!(!monitor.poll_once());
        let mut bytes = slot(&[5, 3, 2]).to_bytes();
        bytes.truncate(bytes.len() - 3);
        nodes[0].put(&error_key("M_", 0), bytes.into());
        assert!(!monitor.poll_once());
        assert_eq!(monitor.state().history(0), &[5, 3]);

        nodes[1].put(&error_key("M_", 1), slot(&[4, 1]).to_bytes().into());
        assert!(monitor.poll_once());
        assert!(monitor.is_done());
        let res = monitor.state().error();
        assert_eq!(res, 0.2, "expected (3 + 1) / 20, got {res}.");
        assert_eq!(monitor.state().global_history(), vec![0.45, 0.2]);
    }
}
