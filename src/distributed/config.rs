use serde::{Serialize, Deserialize};

use crate::{constants::*, director::invalid, Result};

use std::fs;
use std::path::Path;
use std::time::Duration;


/// Settings of a distributed forest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    n_nodes: usize,
    trees_per_node: usize,
    validation_stride: usize,
    sample_ratio: f64,
    seed: u64,
    poll_interval_millis: u64,
    monitor_interval_millis: u64,
    key_prefix: String,
}


impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            n_nodes: DEFAULT_N_NODES,
            trees_per_node: DEFAULT_TREES_PER_NODE,
            validation_stride: DEFAULT_VALIDATION_STRIDE,
            sample_ratio: DEFAULT_SAMPLE_RATIO,
            seed: DEFAULT_SEED,
            poll_interval_millis: DEFAULT_POLL_INTERVAL_MILLIS,
            monitor_interval_millis: DEFAULT_MONITOR_INTERVAL_MILLIS,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}


impl ClusterConfig {
    /// Construct a config with the default values.
    pub fn new() -> Self {
        Self::default()
    }


    /// Parse a config from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }


    /// Read a config from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }


    /// Set the number of nodes.
    pub fn n_nodes(mut self, n_nodes: usize) -> Self {
        self.n_nodes = n_nodes;
        self
    }


    /// Set the number of trees each node grows.
    pub fn trees_per_node(mut self, n_trees: usize) -> Self {
        self.trees_per_node = n_trees;
        self
    }


    /// Hold out every `stride`-th row of a node's data for validation.
    pub fn validation_stride(mut self, stride: usize) -> Self {
        self.validation_stride = stride;
        self
    }


    /// Set the bootstrap ratio, in `(0, 1]`.
    pub fn sample_ratio(mut self, ratio: f64) -> Self {
        self.sample_ratio = ratio;
        self
    }


    /// Set the seed of the randomness.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }


    /// Set the sleep of a validator between two empty polling rounds.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_millis = interval.as_millis() as u64;
        self
    }


    /// Set the sleep of the monitor between two polling cycles.
    pub fn monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval_millis = interval.as_millis() as u64;
        self
    }


    /// Set the prefix of every key the run writes.
    pub fn key_prefix<S: ToString>(mut self, prefix: S) -> Self {
        self.key_prefix = prefix.to_string();
        self
    }


    /// Returns the number of nodes.
    pub fn get_n_nodes(&self) -> usize {
        self.n_nodes
    }


    /// Returns the number of trees each node grows.
    pub fn get_trees_per_node(&self) -> usize {
        self.trees_per_node
    }


    /// Returns the number of trees every node validates.
    pub fn total_trees(&self) -> usize {
        self.n_nodes * self.trees_per_node
    }


    /// Returns the validation stride.
    pub fn get_validation_stride(&self) -> usize {
        self.validation_stride
    }


    /// Returns the bootstrap ratio.
    pub fn get_sample_ratio(&self) -> f64 {
        self.sample_ratio
    }


    /// Returns the seed.
    pub fn get_seed(&self) -> u64 {
        self.seed
    }


    /// Returns the validator polling interval.
    pub fn get_poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_millis)
    }


    /// Returns the monitor polling interval.
    pub fn get_monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_millis)
    }


    /// Returns the key prefix.
    pub fn get_key_prefix(&self) -> &str {
        &self.key_prefix
    }


    /// Check the consistency of the settings.
    pub fn check(&self) -> Result<()> {
        if self.n_nodes == 0 {
            return Err(invalid("`n_nodes` must be positive"));
        }
        if self.trees_per_node == 0 {
            return Err(invalid("`trees_per_node` must be positive"));
        }
        if self.validation_stride < 2 {
            return Err(invalid("`validation_stride` must be at least 2"));
        }
        if !(self.sample_ratio > 0f64 && self.sample_ratio <= 1f64) {
            return Err(invalid("`sample_ratio` must be in (0, 1]"));
        }
        if self.key_prefix.is_empty() {
            return Err(invalid("`key_prefix` must not be empty"));
        }
        Ok(())
    }
}
