use super::{
    result_slot::ResultSlot,
    store::{error_key, KeyValueStore},
};
use crate::{
    common::{Reporter, SilentReporter, Signal},
    constants::PRINT_WIDTH,
};

use std::sync::Arc;
use std::thread;
use std::time::Duration;


/// What the monitor has seen of every node.
///
/// Values only ever grow:
/// a slot that shows fewer trees than already recorded is ignored.
#[derive(Debug, Clone, Default)]
pub struct ProgressState {
    processed: Vec<usize>,
    rows: Vec<u64>,
    history: Vec<Vec<u64>>,
}


impl ProgressState {
    /// Construct an empty state for `n_nodes` nodes.
    pub fn new(n_nodes: usize) -> Self {
        Self {
            processed: vec![0; n_nodes],
            rows: vec![0; n_nodes],
            history: vec![Vec::new(); n_nodes],
        }
    }


    /// Returns the number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.processed.len()
    }


    /// Fold the slot of `node` into the state.
    /// Returns `true` if the slot showed trees not seen before.
    pub fn update(&mut self, node: usize, slot: &ResultSlot) -> bool {
        let seen = self.processed[node];
        let shown = (slot.trees_validated as usize).min(slot.errors.len());
        if shown <= seen { return false; }

        self.history[node].extend_from_slice(&slot.errors[seen..shown]);
        self.processed[node] = shown;
        self.rows[node] = slot.n_rows;
        true
    }


    /// Returns the number of trees `node` has validated.
    pub fn processed(&self, node: usize) -> usize {
        self.processed[node]
    }


    /// Returns the cumulative error counts of `node`, oldest first.
    pub fn history(&self, node: usize) -> &[u64] {
        &self.history[node]
    }


    /// Returns the number of trees validated per node on average.
    pub fn n_trees_computed(&self) -> usize {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 { return 0; }
        self.processed.iter().sum::<usize>() / n_nodes
    }


    /// Returns the latest error over the rows of every reporting node,
    /// or `-1.0` if no node has reported.
    pub fn error(&self) -> f64 {
        let rows = self.rows.iter().sum::<u64>();
        if rows == 0 { return -1f64; }

        let errors = self.history.iter()
            .filter_map(|h| h.last())
            .sum::<u64>();
        errors as f64 / rows as f64
    }


    /// Returns the latest error of `node` alone,
    /// or `-1.0` if it has not reported.
    pub fn node_error(&self, node: usize) -> f64 {
        match self.history[node].last() {
            Some(&e) if self.rows[node] > 0 => e as f64 / self.rows[node] as f64,
            _ => -1f64,
        }
    }


    /// Returns the global error after `t + 1` trees,
    /// for every `t` every node has reached.
    pub fn global_history(&self) -> Vec<f64> {
        let rows = self.rows.iter().sum::<u64>();
        let reached = self.processed.iter().copied().min().unwrap_or(0);
        if rows == 0 { return Vec::new(); }

        (0..reached).map(|t| {
                let errors = self.history.iter()
                    .map(|h| h[t])
                    .sum::<u64>();
                errors as f64 / rows as f64
            })
            .collect()
    }
}


/// Watches every node's result slot until the cluster is done.
pub struct ProgressMonitor {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
    total_trees: usize,
    interval: Duration,
    state: ProgressState,
    cursor: usize,
    reporter: Arc<dyn Reporter>,
}


impl ProgressMonitor {
    /// Construct a monitor of `n_nodes` nodes that is done once
    /// every node has validated `total_trees` trees.
    pub fn new<S: ToString>(
        store: Arc<dyn KeyValueStore>,
        prefix: S,
        n_nodes: usize,
        total_trees: usize,
    ) -> Self
    {
        Self {
            store,
            prefix: prefix.to_string(),
            total_trees,
            interval: Duration::from_millis(
                crate::constants::DEFAULT_MONITOR_INTERVAL_MILLIS
            ),
            state: ProgressState::new(n_nodes),
            cursor: 0,
            reporter: Arc::new(SilentReporter),
        }
    }


    /// Set the sleep between two polling cycles.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }


    /// Send progress text to `reporter`.
    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }


    /// Returns the state seen so far.
    pub fn state(&self) -> &ProgressState {
        &self.state
    }


    /// Returns `true` once every node has validated every tree.
    pub fn is_done(&self) -> bool {
        self.state.n_trees_computed() >= self.total_trees
    }


    /// Read every slot once.
    /// Each call starts one node further on,
    /// so a periodic read miss cannot hide the same slot forever.
    /// Returns `true` if some node advanced.
    pub fn poll_once(&mut self) -> bool {
        let n_nodes = self.state.n_nodes();
        if n_nodes == 0 { return false; }

        let start = self.cursor;
        self.cursor = (self.cursor + 1) % n_nodes;

        let mut advanced = false;
        for node in (0..n_nodes).map(|k| (start + k) % n_nodes) {
            let key = error_key(&self.prefix, node);
            let slot = self.store.get(&key)
                .and_then(|bytes| ResultSlot::from_bytes(&bytes));
            let Some(slot) = slot else { continue; };
            advanced |= self.state.update(node, &slot);
        }

        if advanced {
            let n_trees = self.state.n_trees_computed();
            let error = self.state.error();
            self.reporter.report(&format!(
                "{n_trees:>PRINT_WIDTH$} trees | error {error:.5}"
            ));
        }
        advanced
    }


    /// Poll until the cluster is done or `stop` is raised,
    /// then raise `stop` and return what was seen.
    pub fn run(mut self, stop: &Signal) -> ProgressState {
        loop {
            self.poll_once();
            if self.is_done() || stop.is_raised() { break; }
            thread::sleep(self.interval);
        }
        stop.raise();
        self.state
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn slot(errors: &[u64], n_rows: u64) -> ResultSlot {
        ResultSlot {
            trees_validated: errors.len() as u32,
            n_rows,
            errors: errors.to_vec(),
        }
    }

    #[test]
    fn test_update_never_regresses_01() {
        let mut state = ProgressState::new(2);
        assert!(state.update(0, &slot(&[3, 2], 10)));
        assert!(!state.update(0, &slot(&[3], 10)), "a stale slot is ignored.");
        assert_eq!(state.processed(0), 2);
        assert_eq!(state.history(0), &[3, 2]);

        assert!(state.update(0, &slot(&[3, 2, 2], 10)));
        assert_eq!(state.history(0), &[3, 2, 2]);
    }

    #[test]
    fn test_global_error_02() {
        let mut state = ProgressState::new(2);
        state.update(0, &slot(&[4, 2], 10));
        state.update(1, &slot(&[1], 10));

        assert_eq!(state.n_trees_computed(), 1);
        let res = state.error();
        assert_eq!(res, 0.15, "expected (2 + 1) / 20, got {res}.");
        let res = state.global_history();
        assert_eq!(res, vec![0.25], "got {res:?}.");
    }

    #[test]
    fn test_empty_state_03() {
        let state = ProgressState::new(3);
        assert_eq!(state.error(), -1.0);
        assert!(state.global_history().is_empty());
        assert_eq!(state.node_error(1), -1.0);
    }

    /// Misses every other read, counted over all keys.
    struct Alternating {
        inner: Arc<dyn KeyValueStore>,
        reads: std::sync::atomic::AtomicUsize,
    }

    impl KeyValueStore for Alternating {
        fn put(&self, key: &str, value: Arc<[u8]>) {
            self.inner.put(key, value);
        }

        fn get(&self, key: &str) -> Option<Arc<[u8]>> {
            use std::sync::atomic::Ordering;
            if self.reads.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
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

    #[test]
    fn test_periodic_miss_does_not_starve_04() {
        let cloud = crate::distributed::InMemoryCloud::new(2);
        let node0: Arc<dyn KeyValueStore> = Arc::new(cloud.node(0));
        node0.put(&error_key("P_", 0), slot(&[2, 1], 10).to_bytes().into());
        node0.put(&error_key("P_", 1), slot(&[3, 0], 10).to_bytes().into());

        let store = Arc::new(Alternating {
            inner: node0,
            reads: std::sync::atomic::AtomicUsize::new(0),
        });
        let mut monitor = ProgressMonitor::new(store, "P_", 2, 2);

        // Two nodes, every other read misses:
        // a fixed reading order would miss node 0 on every cycle.
        for _ in 0..4 {
            monitor.poll_once();
            if monitor.is_done() { break; }
        }
        assert!(monitor.is_done());
        assert_eq!(monitor.state().history(0), &[2, 1]);
        assert_eq!(monitor.state().history(1), &[3, 0]);
    }
}
