//! Grows trees from resampled training data
//! in the caller thread or in a pool of worker threads.

use rand::prelude::*;

use crate::{
    common::{checker, CountDownLatch},
    director::BuildObserver,
    error::from_panic,
    Result,
    Sample,
    TreeGrower,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};


/// Grows trees until told to stop.
///
/// Every worker loops independently:
/// check the termination flag, draw a ticket from the shared tree budget,
/// resample, grow, and hand the tree to
/// [`BuildObserver::on_tree_built`].
/// [`TreeBuilder::terminate`] only raises a flag,
/// so a tree being grown is always finished.
/// The last worker out calls [`BuildObserver::on_builder_terminated`],
/// exactly once per pool.
pub struct TreeBuilder<G> {
    sample: Arc<Sample>,
    grower: Arc<G>,
    sample_ratio: f64,
    max_trees: Option<usize>,
    seed: u64,
    terminate: AtomicBool,
    tickets: AtomicUsize,
    live: CountDownLatch,
}


impl<G> TreeBuilder<G>
    where G: TreeGrower,
{
    /// Construct a new builder that grows trees from `sample`.
    /// By default the builder has no tree budget,
    /// trains every tree on the full sample,
    /// and seeds its random number generators with `DEFAULT_SEED`.
    pub fn new(sample: Arc<Sample>, grower: Arc<G>) -> Self {
        checker::check_sample(&sample);
        Self {
            sample,
            grower,
            sample_ratio: crate::constants::DEFAULT_SAMPLE_RATIO,
            max_trees: None,
            seed: crate::constants::DEFAULT_SEED,
            terminate: AtomicBool::new(false),
            tickets: AtomicUsize::new(0),
            live: CountDownLatch::new(0),
        }
    }


    /// Set the bootstrap ratio.
    /// `1.0` trains every tree on the whole sample;
    /// smaller values draw `ratio * n_sample` rows with replacement.
    pub fn sample_ratio(mut self, ratio: f64) -> Self {
        checker::check_sample_ratio(ratio);
        self.sample_ratio = ratio;
        self
    }


    /// Stop after `max_trees` trees, counted over all workers.
    pub fn max_trees(mut self, max_trees: usize) -> Self {
        self.max_trees = Some(max_trees);
        self
    }


    /// Set the seed of the randomness.
    /// The `k`-th tree is grown with a generator seeded by `seed + k`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }


    /// Ask every worker to stop after its current tree.
    pub fn terminate(&self) {
        self.terminate.store(true, Ordering::SeqCst);
    }


    /// Returns `true` once termination has been requested.
    pub fn is_terminated(&self) -> bool {
        self.terminate.load(Ordering::SeqCst)
    }


    /// Returns the number of tickets drawn from the tree budget so far.
    pub fn trees_started(&self) -> usize {
        self.tickets.load(Ordering::SeqCst)
            .min(self.max_trees.unwrap_or(usize::MAX))
    }


    /// Run one worker in the caller thread until the builder terminates.
    pub fn start<O>(&self, observer: &O) -> Result<()>
        where O: BuildObserver<G::Tree> + ?Sized,
    {
        self.live.add(1);
        self.work(observer)
    }


    /// Spawn `n_threads` workers.
    /// Each handle yields the outcome of its worker.
    pub fn spawn<O>(self: &Arc<Self>, n_threads: usize, observer: Arc<O>)
        -> Vec<JoinHandle<Result<()>>>
        where O: BuildObserver<G::Tree> + ?Sized + Send + Sync + 'static,
              G: 'static,
    {
        checker::check_threads(n_threads);
        // Arm the latch before any worker can finish.
        self.live.add(n_threads);

        (0..n_threads).map(|k| {
                let builder = Arc::clone(self);
                let observer = Arc::clone(&observer);
                thread::Builder::new()
                    .name(format!("tree-builder-{k}"))
                    .spawn(move || builder.work(&*observer))
                    .unwrap_or_else(|e| {
                        panic!("failed to spawn a builder thread: {e}")
                    })
            })
            .collect()
    }


    fn work<O>(&self, observer: &O) -> Result<()>
        where O: BuildObserver<G::Tree> + ?Sized,
    {
        // A panicking grower still has to count the latch down.
        let outcome = match self.build_loop(observer) {
            Ok(res) => res,
            Err(payload) => Err(from_panic(payload)),
        };
        if outcome.is_err() {
            self.terminate();
        }

        if self.live.count_down() {
            log::debug!("last builder worker out");
            observer.on_builder_terminated();
        }
        outcome
    }


    fn build_loop<O>(&self, observer: &O)
        -> std::thread::Result<Result<()>>
        where O: BuildObserver<G::Tree> + ?Sized,
    {
        let run = || -> Result<()> {
            while !self.is_terminated() {
                let ticket = self.tickets.fetch_add(1, Ordering::SeqCst);
                if self.max_trees.is_some_and(|max| ticket >= max) {
                    self.terminate();
                    break;
                }

                let tree = self.build_one(ticket)?;
                observer.on_tree_built(Arc::new(tree))?;
            }
            Ok(())
        };
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(run))
    }


    fn build_one(&self, ticket: usize) -> Result<G::Tree> {
        let mut rng = StdRng::seed_from_u64(
            self.seed.wrapping_add(ticket as u64)
        );
        let n_sample = self.sample.shape().0;
        let rows = if self.sample_ratio >= 1f64 {
            (0..n_sample).collect::<Vec<_>>()
        } else {
            self.sample.bootstrap(self.sample_ratio, &mut rng)
        };

        log::trace!("growing tree #{ticket} from {} rows", rows.len());
        self.grower.grow(&self.sample, &rows, &mut rng)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Classifier, ForestError};
    use std::sync::Mutex;
    use std::time::Duration;

    struct Leaf;
    impl Classifier for Leaf {
        fn predict(&self, _: &Sample, _: usize) -> usize { 0 }
    }

    /// Sleeps for `delay` and then returns a leaf, or fails if `fail`.
    struct Slow {
        delay: Duration,
        fail: bool,
    }

    impl TreeGrower for Slow {
        type Tree = Leaf;

        fn name(&self) -> &str { "Slow" }

        fn grow(&self, _: &Sample, rows: &[usize], _: &mut StdRng)
            -> Result<Leaf>
        {
            thread::sleep(self.delay);
            if self.fail || rows.is_empty() {
                return Err(ForestError::EmptySample);
            }
            Ok(Leaf)
        }
    }

    #[derive(Default)]
    struct Counter {
        built: AtomicUsize,
        terminated: AtomicUsize,
        order: Mutex<Vec<&'static str>>,
    }

    impl BuildObserver<Leaf> for Counter {
        fn on_tree_built(&self, _tree: Arc<Leaf>) -> Result<()> {
            self.built.fetch_add(1, Ordering::SeqCst);
            self.order.lock().unwrap().push("built");
            Ok(())
        }

        fn on_builder_terminated(&self) {
            self.terminated.fetch_add(1, Ordering::SeqCst);
            self.order.lock().unwrap().push("terminated");
        }
    }

    fn sample() -> Arc<Sample> {
        let sample = Sample::from_columns(
            vec![("x", vec![0.0, 1.0, 2.0, 3.0])],
            vec![0, 1, 0, 1],
        ).unwrap();
        Arc::new(sample)
    }

    fn grower(delay_millis: u64, fail: bool) -> Arc<Slow> {
        Arc::new(Slow { delay: Duration::from_millis(delay_millis), fail })
    }

    #[test]
    fn test_terminate_fires_once_01() {
        let builder = Arc::new(TreeBuilder::new(sample(), grower(1, false)));
        let counter = Arc::new(Counter::default());
        let handles = builder.spawn(4, Arc::clone(&counter));

        thread::sleep(Duration::from_millis(30));
        builder.terminate();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(counter.terminated.load(Ordering::SeqCst), 1);
        let order = counter.order.lock().unwrap();
        assert_eq!(order.last(), Some(&"terminated"));
        let built = counter.built.load(Ordering::SeqCst);
        assert_eq!(order.len(), built + 1);
    }

    #[test]
    fn test_budget_is_shared_02() {
        let builder = TreeBuilder::new(sample(), grower(0, false))
            .max_trees(7);
        let builder = Arc::new(builder);
        let counter = Arc::new(Counter::default());
        let handles = builder.spawn(3, Arc::clone(&counter));
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(counter.built.load(Ordering::SeqCst), 7);
        assert_eq!(counter.terminated.load(Ordering::SeqCst), 1);
        assert_eq!(builder.trees_started(), 7);
        assert!(builder.is_terminated());
    }

    #[test]
    fn test_grower_error_stops_the_builder_03() {
        let builder = TreeBuilder::new(sample(), grower(0, true));
        let counter = Counter::default();
        let res = builder.start(&counter);

        assert!(matches!(res, Err(ForestError::EmptySample)), "got {res:?}.");
        assert!(builder.is_terminated());
        assert_eq!(counter.built.load(Ordering::SeqCst), 0);
        assert_eq!(counter.terminated.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_grower_error_in_pool_04() {
        let builder = Arc::new(TreeBuilder::new(sample(), grower(0, true)));
        let counter = Arc::new(Counter::default());
        let handles = builder.spawn(3, Arc::clone(&counter));
        let failed = handles.into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|res| res.is_err())
            .count();

        assert!(failed >= 1);
        assert_eq!(counter.terminated.load(Ordering::SeqCst), 1);
    }
}
