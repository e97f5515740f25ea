use super::{
    config::{invalid, ForestConfig},
    observer::*,
};
use crate::{
    aggregator::Aggregator,
    builder::TreeBuilder,
    common::{CountDownLatch, Reporter, SilentReporter},
    constants::PRINT_WIDTH,
    error::from_panic,
    validator::Validator,
    Classifier,
    ForestError,
    RandomForest,
    Result,
    Sample,
    TreeGrower,
};

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::thread::JoinHandle;


/// What a forest run produced.
#[derive(Debug, Clone)]
pub struct ForestReport<T> {
    /// Every tree grown, as one majority-vote classifier.
    pub forest: RandomForest<T>,
    /// Final majority-vote error on the validation sample.
    pub error: f64,
    /// `history[k]` is the ensemble error after `k + 1` trees.
    pub history: Vec<f64>,
    /// `tree_errors[k]` is the error of the `k`-th aggregated tree alone.
    pub tree_errors: Vec<f64>,
}


/// Grows a forest in one process.
///
/// Builder threads grow trees and queue them for the validator threads,
/// which score each tree once on the validation sample
/// and fold its mistakes into a single [`Aggregator`].
/// [`LocalForest::run`] blocks until every grown tree is aggregated.
///
/// # Example
/// ```no_run
/// use miniforest::prelude::*;
///
/// # let sample: Sample = unimplemented!();
/// let (train, valid) = sample.split_holdout(3);
///
/// let grower = DecisionTreeBuilder::new()
///     .max_depth(8)
///     .build();
/// let config = ForestConfig::new()
///     .n_trees(50)
///     .builder_threads(4);
///
/// let report = LocalForest::new(grower)
///     .config(config)
///     .reporter(ConsoleReporter::default())
///     .run(&train, &valid)
///     .unwrap();
/// println!("validation error: {}", report.error);
/// ```
pub struct LocalForest<G> {
    grower: Arc<G>,
    config: ForestConfig,
    reporter: Arc<dyn Reporter>,
}


impl<G> LocalForest<G>
    where G: TreeGrower + 'static,
{
    /// Construct a new run that grows trees with `grower`.
    pub fn new(grower: G) -> Self {
        Self {
            grower: Arc::new(grower),
            config: ForestConfig::default(),
            reporter: Arc::new(SilentReporter),
        }
    }


    /// Set the run settings.
    pub fn config(mut self, config: ForestConfig) -> Self {
        self.config = config;
        self
    }


    /// Send progress text to `reporter`.
    pub fn reporter<R: Reporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }


    /// Grow `n_trees` trees from `train`, validating on `valid`.
    pub fn run(&self, train: &Sample, valid: &Sample)
        -> Result<ForestReport<G::Tree>>
    {
        self.config.check()?;
        if train.shape().0 == 0 {
            return Err(ForestError::EmptySample);
        }
        if valid.shape().0 == 0 {
            return Err(invalid("the validation sample has no row"));
        }
        self.print_info(train, valid);

        let n_classes = train.n_classes().max(valid.n_classes());
        let validator = Arc::new(Validator::new(Arc::new(valid.clone())));
        let director = LocalDirector::new(
            Arc::clone(&validator), n_classes, Arc::clone(&self.reporter),
        );

        let builder = TreeBuilder::new(
                Arc::new(train.clone()), Arc::clone(&self.grower)
            )
            .sample_ratio(self.config.get_sample_ratio())
            .max_trees(self.config.get_n_trees())
            .seed(self.config.get_seed());
        let builder = Arc::new(builder);

        let validators = validator.start(
            self.config.get_validator_threads(), Arc::clone(&director)
        );
        let builders = builder.spawn(
            self.config.get_builder_threads(), Arc::clone(&director)
        );

        director.done.wait();

        let built = join_builders(builders);
        let validated = join_validators(validators);
        built?;
        validated?;
        director.into_report()
    }


    fn print_info(&self, train: &Sample, valid: &Sample) {
        let reporter = &self.reporter;
        reporter.report(&format!(
            "{}: {} trees, {} train rows, {} validation rows",
            self.grower.name(),
            self.config.get_n_trees(),
            train.shape().0,
            valid.shape().0,
        ));
        if let Some(info) = self.grower.info() {
            for (key, value) in info {
                reporter.report(&format!("- {key}: {value}"));
            }
        }
    }
}


fn join_builders(handles: Vec<JoinHandle<Result<()>>>) -> Result<()> {
    let mut outcome = Ok(());
    for handle in handles {
        let res = handle.join().unwrap_or_else(|p| Err(from_panic(p)));
        if outcome.is_ok() {
            outcome = res;
        }
    }
    outcome
}


fn join_validators(handles: Vec<JoinHandle<()>>) -> Result<()> {
    let mut outcome = Ok(());
    for handle in handles {
        if let Err(payload) = handle.join() {
            outcome = Err(from_panic(payload));
        }
    }
    outcome
}


/// The in-process wiring of builder, validator and aggregator.
struct LocalDirector<T> {
    validator: Arc<Validator<T>>,
    aggregator: Mutex<Aggregator<T>>,
    reporter: Arc<dyn Reporter>,
    history: Mutex<Vec<f64>>,
    tree_errors: Mutex<Vec<f64>>,
    failure: Mutex<Option<ForestError>>,
    done: CountDownLatch,
}


impl<T> LocalDirector<T>
    where T: Classifier + Send + Sync + 'static,
{
    fn new(
        validator: Arc<Validator<T>>,
        n_classes: usize,
        reporter: Arc<dyn Reporter>,
    ) -> Arc<Self>
    {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let aggregator = Aggregator::new(1, n_classes)
                .observer(Weak::clone(this));
            Self {
                validator,
                aggregator: Mutex::new(aggregator),
                reporter,
                history: Mutex::new(Vec::new()),
                tree_errors: Mutex::new(Vec::new()),
                failure: Mutex::new(None),
                done: CountDownLatch::new(1),
            }
        })
    }


    fn into_report(&self) -> Result<ForestReport<T>> {
        if let Some(e) = lock(&self.failure).take() {
            return Err(e);
        }
        let aggregator = lock(&self.aggregator);
        let error = if aggregator.n_trees() == 0 {
            aggregator.error()
        } else {
            aggregator.error().max(0f64)
        };
        Ok(ForestReport {
            forest: aggregator.forest(),
            error,
            history: lock(&self.history).clone(),
            tree_errors: lock(&self.tree_errors).clone(),
        })
    }
}


impl<T> BuildObserver<T> for LocalDirector<T>
    where T: Classifier + Send + Sync + 'static,
{
    fn on_tree_built(&self, tree: Arc<T>) -> Result<()> {
        self.validator.validate_tree(tree);
        Ok(())
    }


    fn on_builder_terminated(&self) {
        let n_stops = self.validator.close();
        log::debug!("builder done; closing {n_stops} validator workers");
    }
}


impl<T> ValidationObserver<T> for LocalDirector<T>
    where T: Classifier + Send + Sync + 'static,
{
    fn on_tree_validated(
        &self,
        tree: &Arc<T>,
        n_rows: usize,
        bad_rows: &[usize],
        bad_votes: &[usize],
    )
    {
        let mut aggregator = lock(&self.aggregator);
        match aggregator.aggregate(0, tree, n_rows, bad_rows, bad_votes) {
            Ok(true) => {
                let error = bad_rows.len() as f64 / n_rows as f64;
                lock(&self.tree_errors).push(error);
            },
            Ok(false) => {},
            Err(e) => {
                log::warn!("failed to aggregate a tree: {e}");
                lock(&self.failure).get_or_insert(e);
            },
        }
    }


    fn on_validator_terminated(&self) {
        self.done.count_down();
    }
}


impl<T> AggregationObserver for LocalDirector<T> {
    fn on_aggregator_change(&self, n_trees: usize, error: f64) {
        // `-1` only means no mistake yet.
        let error = error.max(0f64);
        lock(&self.history).push(error);
        self.reporter.report(&format!(
            "{n_trees:>PRINT_WIDTH$} trees | error {error:.5}"
        ));
    }
}


#[inline]
fn lock<U>(mutex: &Mutex<U>) -> MutexGuard<'_, U> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
