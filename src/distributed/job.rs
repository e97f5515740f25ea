use serde::{de::DeserializeOwned, Serialize};

use super::{
    config::ClusterConfig,
    monitor::{ProgressMonitor, ProgressState},
    polling_validator::PollingValidator,
    publisher::TreePublisher,
    store::{InMemoryCloud, KeyValueStore},
};
use crate::{
    builder::TreeBuilder,
    common::{Reporter, SilentReporter, Signal},
    director::invalid,
    error::from_panic,
    ForestError,
    RandomForest,
    Result,
    Sample,
    TreeGrower,
};

use std::sync::Arc;
use std::thread::{self, JoinHandle};


/// What a distributed run produced.
#[derive(Debug, Clone)]
pub struct ClusterReport<T> {
    /// Every tree of every node, as one majority-vote classifier.
    pub forest: RandomForest<T>,
    /// Final error over the validation rows of every node.
    pub error: f64,
    /// `history[t]` is the global error after `t + 1` trees.
    pub history: Vec<f64>,
    /// Final error of each node on its own validation rows.
    pub node_errors: Vec<f64>,
    /// Trees validated per node, as last seen by the monitor.
    pub n_trees_computed: usize,
}


/// Grows a forest over a simulated cluster.
///
/// The sample is cut into one contiguous chunk per node,
/// and each chunk into training rows and validation rows.
/// Every node grows `trees_per_node` trees from its training rows
/// and publishes them to the store;
/// every node validates every published tree on its validation rows
/// and publishes its error history to its result slot;
/// a monitor merges the slots into one global error.
///
/// # Example
/// ```no_run
/// use miniforest::prelude::*;
/// use std::time::Duration;
///
/// # let sample: Sample = unimplemented!();
/// let grower = DecisionTreeBuilder::new()
///     .max_depth(8)
///     .build();
/// let config = ClusterConfig::new()
///     .n_nodes(4)
///     .trees_per_node(25)
///     .poll_interval(Duration::from_millis(10));
///
/// let report = DistributedForest::new(grower)
///     .config(config)
///     .reporter(ConsoleReporter::new("cluster"))
///     .run(&sample)
///     .unwrap();
/// println!("error: {}", report.error);
/// ```
pub struct DistributedForest<G> {
    grower: Arc<G>,
    config: ClusterConfig,
    reporter: Arc<dyn Reporter>,
    stores: Option<Vec<Arc<dyn KeyValueStore>>>,
}


impl<G> DistributedForest<G>
    where G: TreeGrower + 'static,
          G::Tree: Serialize + DeserializeOwned,
{
    /// Construct a new run that grows trees with `grower`.
    pub fn new(grower: G) -> Self {
        Self {
            grower: Arc::new(grower),
            config: ClusterConfig::default(),
            reporter: Arc::new(SilentReporter),
            stores: None,
        }
    }


    /// Set the run settings.
    pub fn config(mut self, config: ClusterConfig) -> Self {
        self.config = config;
        self
    }


    /// Send progress text to `reporter`.
    pub fn reporter<R: Reporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }


    /// Use the given per-node store handles,
    /// `stores[k]` being the view of node `k`.
    /// By default each run gets a fresh [`InMemoryCloud`].
    pub fn stores(mut self, stores: Vec<Arc<dyn KeyValueStore>>) -> Self {
        self.stores = Some(stores);
        self
    }


    /// Run the job on `sample` and block until every node
    /// has validated every tree.
    pub fn run(&self, sample: &Sample) -> Result<ClusterReport<G::Tree>> {
        self.config.check()?;
        if sample.shape().0 == 0 {
            return Err(ForestError::EmptySample);
        }
        let n_nodes = self.config.get_n_nodes();
        let stores = self.node_stores()?;
        let chunks = self.split(sample)?;
        let n_classes = sample.n_classes();

        self.reporter.report(&format!(
            "{}: {n_nodes} nodes x {} trees, {} rows",
            self.grower.name(),
            self.config.get_trees_per_node(),
            sample.shape().0,
        ));

        let stop = Arc::new(Signal::new());
        let mut builders = Vec::with_capacity(n_nodes);
        let mut validators = Vec::with_capacity(n_nodes);
        for (node, (train, valid)) in chunks.into_iter().enumerate() {
            let store = &stores[node];
            let spawned = self.spawn_builder(node, train, store, &stop)
                .and_then(|h| {
                    builders.push(h);
                    self.spawn_validator(node, valid, store, n_classes, &stop)
                })
                .map(|h| validators.push(h));
            if let Err(e) = spawned {
                stop.raise();
                return Err(e);
            }
        }

        let monitor = ProgressMonitor::new(
                Arc::clone(&stores[0]),
                self.config.get_key_prefix(),
                n_nodes,
                self.config.total_trees(),
            )
            .interval(self.config.get_monitor_interval())
            .reporter(Arc::clone(&self.reporter));
        let monitor = {
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("progress-monitor".to_string())
                .spawn(move || monitor.run(&stop))
        };
        let monitor = match monitor {
            Ok(handle) => handle,
            Err(e) => {
                stop.raise();
                return Err(e.into());
            },
        };

        stop.wait();

        let mut outcome = Ok(());
        for handle in builders {
            let res = handle.join().unwrap_or_else(|p| Err(from_panic(p)));
            if outcome.is_ok() { outcome = res; }
        }
        let mut forests = Vec::with_capacity(n_nodes);
        for handle in validators {
            match handle.join().unwrap_or_else(|p| Err(from_panic(p))) {
                Ok(forest) => forests.push(forest),
                Err(e) => if outcome.is_ok() { outcome = Err(e); },
            }
        }
        let state = monitor.join().map_err(from_panic)?;
        outcome?;

        self.into_report(forests, state)
    }


    fn node_stores(&self) -> Result<Vec<Arc<dyn KeyValueStore>>> {
        let n_nodes = self.config.get_n_nodes();
        match &self.stores {
            Some(stores) if stores.len() == n_nodes => Ok(stores.clone()),
            Some(stores) => Err(invalid(&format!(
                "got {} store handles for {n_nodes} nodes", stores.len()
            ))),
            None => {
                let cloud = InMemoryCloud::new(n_nodes);
                let stores = cloud.nodes()
                    .into_iter()
                    .map(|node| Arc::new(node) as Arc<dyn KeyValueStore>)
                    .collect();
                Ok(stores)
            },
        }
    }


    fn split(&self, sample: &Sample) -> Result<Vec<(Arc<Sample>, Arc<Sample>)>> {
        let stride = self.config.get_validation_stride();
        sample.partition(self.config.get_n_nodes())
            .into_iter()
            .enumerate()
            .map(|(node, chunk)| {
                let (train, valid) = chunk.split_holdout(stride);
                if train.shape().0 == 0 || valid.shape().0 == 0 {
                    return Err(invalid(&format!(
                        "node {node} needs at least one training row \
                         and one validation row"
                    )));
                }
                Ok((Arc::new(train), Arc::new(valid)))
            })
            .collect()
    }


    fn spawn_builder(
        &self,
        node: usize,
        train: Arc<Sample>,
        store: &Arc<dyn KeyValueStore>,
        stop: &Arc<Signal>,
    ) -> Result<JoinHandle<Result<()>>>
    {
        let seed = self.config.get_seed().wrapping_add((node as u64) << 32);
        let builder = TreeBuilder::new(train, Arc::clone(&self.grower))
            .sample_ratio(self.config.get_sample_ratio())
            .max_trees(self.config.get_trees_per_node())
            .seed(seed);
        let publisher = TreePublisher::new(
            Arc::clone(store),
            node,
            self.config.get_key_prefix(),
            Arc::clone(&self.reporter),
        );
        let stop = Arc::clone(stop);

        let handle = thread::Builder::new()
            .name(format!("node-{node}"))
            .spawn(move || {
                let res = builder.start(&publisher);
                if let Err(e) = &res {
                    log::warn!("node {node} builder failed: {e}");
                    stop.raise();
                }
                res
            })?;
        Ok(handle)
    }


    fn spawn_validator(
        &self,
        node: usize,
        valid: Arc<Sample>,
        store: &Arc<dyn KeyValueStore>,
        n_classes: usize,
        stop: &Arc<Signal>,
    ) -> Result<JoinHandle<Result<RandomForest<G::Tree>>>>
    {
        let mut validator = PollingValidator::<G::Tree>::new(
                node,
                self.config.get_n_nodes(),
                self.config.get_trees_per_node(),
                Arc::clone(store),
                valid,
                self.config.get_key_prefix(),
            )
            .n_classes(n_classes)
            .poll_interval(self.config.get_poll_interval());
        let stop = Arc::clone(stop);

        let handle = thread::Builder::new()
            .name(format!("node-{node}-validator"))
            .spawn(move || {
                let res = validator.run(&stop);
                if let Err(e) = &res {
                    log::warn!("node {node} validator failed: {e}");
                    stop.raise();
                }
                res.map(|_| validator.forest())
            })?;
        Ok(handle)
    }


    fn into_report(
        &self,
        forests: Vec<RandomForest<G::Tree>>,
        state: ProgressState,
    ) -> Result<ClusterReport<G::Tree>>
    {
        let n_trees_computed = state.n_trees_computed();
        let incomplete = ForestError::Incomplete {
            done: n_trees_computed,
            total: self.config.total_trees(),
        };
        if n_trees_computed < self.config.total_trees() {
            return Err(incomplete);
        }
        let forest = forests.into_iter()
            .next()
            .ok_or(incomplete)?;
        let node_errors = (0..state.n_nodes())
            .map(|node| state.node_error(node).max(0f64))
            .collect();

        Ok(ClusterReport {
            forest,
            error: state.error().max(0f64),
            history: state.global_history(),
            node_errors,
            n_trees_computed,
        })
    }
}
