use rayon::prelude::*;
use serde::de::DeserializeOwned;

use super::{
    result_slot::ResultSlot,
    store::{error_key, tree_key, KeyValueStore},
};
use crate::{
    aggregator::Aggregator,
    common::{checker, Signal},
    Classifier,
    RandomForest,
    Result,
    Sample,
};

use std::sync::Arc;
use std::thread;
use std::time::Duration;


/// A node's validator in the distributed pipeline.
///
/// Polls the store round-robin over the builder nodes for the next tree
/// each of them has not handed over yet,
/// scores it on the node's validation rows,
/// and publishes the node's cumulative error history to its result slot
/// after every tree.
/// It stops after `n_nodes * trees_per_node` trees.
pub struct PollingValidator<T> {
    node: usize,
    n_nodes: usize,
    trees_per_node: usize,
    store: Arc<dyn KeyValueStore>,
    sample: Arc<Sample>,
    prefix: String,
    poll_interval: Duration,
    aggregator: Aggregator<T>,
    next: Vec<usize>,
    cursor: usize,
    errors: Vec<u64>,
}


impl<T> PollingValidator<T>
    where T: Classifier + DeserializeOwned + Send + Sync,
{
    /// Construct the validator of `node`,
    /// scoring trees on its validation `sample`.
    pub fn new<S: ToString>(
        node: usize,
        n_nodes: usize,
        trees_per_node: usize,
        store: Arc<dyn KeyValueStore>,
        sample: Arc<Sample>,
        prefix: S,
    ) -> Self
    {
        checker::check_sample(&sample);
        let n_classes = sample.n_classes();
        Self {
            node,
            n_nodes,
            trees_per_node,
            store,
            sample,
            prefix: prefix.to_string(),
            poll_interval: Duration::from_millis(
                crate::constants::DEFAULT_POLL_INTERVAL_MILLIS
            ),
            aggregator: Aggregator::new(1, n_classes),
            next: vec![0; n_nodes],
            cursor: node % n_nodes.max(1),
            errors: Vec::with_capacity(n_nodes * trees_per_node),
        }
    }


    /// Set the sleep between two rounds that found no tree.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }


    /// Set the number of classes trees may predict.
    pub fn n_classes(mut self, n_classes: usize) -> Self {
        self.aggregator = Aggregator::new(1, n_classes);
        self
    }


    /// Returns the number of trees to validate in total.
    pub fn total_trees(&self) -> usize {
        self.n_nodes * self.trees_per_node
    }


    /// Returns the number of trees validated so far.
    pub fn n_validated(&self) -> usize {
        self.errors.len()
    }


    /// Returns the majority-vote error over the node's validation rows.
    pub fn error(&self) -> f64 {
        self.aggregator.error()
    }


    /// Returns the forest of every tree validated so far.
    pub fn forest(&self) -> RandomForest<T> {
        self.aggregator.forest()
    }


    /// Poll until every tree is validated or `stop` is raised.
    pub fn run(&mut self, stop: &Signal) -> Result<()> {
        let total = self.total_trees();
        while self.n_validated() < total && !stop.is_raised() {
            if !self.poll_round()? {
                thread::sleep(self.poll_interval);
            }
        }
        log::debug!(
            "node {} validator done after {} trees",
            self.node, self.n_validated()
        );
        Ok(())
    }


    /// Visit every builder node once.
    /// Returns `true` if at least one tree was validated.
    pub fn poll_round(&mut self) -> Result<bool> {
        let mut hit = false;
        for _ in 0..self.n_nodes {
            let builder = self.cursor;
            self.cursor = (self.cursor + 1) % self.n_nodes;

            let index = self.next[builder];
            if index >= self.trees_per_node { continue; }

            let key = tree_key(&self.prefix, builder, index);
            let bytes = match self.store.get(&key) {
                Some(bytes) => bytes,
                None => continue,
            };
            let tree: T = serde_json::from_slice(&bytes)?;
            self.next[builder] += 1;

            self.validate(Arc::new(tree))?;
            if !self.store.is_home(&key) {
                self.store.free(&key);
            }
            hit = true;
        }
        Ok(hit)
    }


    fn validate(&mut self, tree: Arc<T>) -> Result<()> {
        let sample = &self.sample;
        let target = sample.target();
        let n_rows = sample.shape().0;

        let (bad_rows, bad_votes): (Vec<usize>, Vec<usize>) = (0..n_rows)
            .into_par_iter()
            .filter_map(|row| {
                let class = tree.predict(sample, row);
                (class != target[row]).then_some((row, class))
            })
            .unzip();

        self.aggregator.aggregate(0, &tree, n_rows, &bad_rows, &bad_votes)?;
        self.errors.push(self.aggregator.bad_row_count() as u64);

        let slot = ResultSlot {
            trees_validated: self.errors.len() as u32,
            n_rows: n_rows as u64,
            errors: self.errors.clone(),
        };
        let key = error_key(&self.prefix, self.node);
        self.store.put(&key, Arc::from(slot.to_bytes()));
        Ok(())
    }
}
