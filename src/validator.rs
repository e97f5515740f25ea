//! Scores trees against a fixed validation sample.
//!
//! Trees are handed over through an unbounded channel,
//! so the producer never blocks;
//! a pool of workers takes them one by one and reports
//! the rows each tree gets wrong.

pub(crate) mod score;

pub use score::{Score, score_tree};

use crate::{
    common::{checker, CountDownLatch},
    director::ValidationObserver,
    Classifier,
    Sample,
};

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};


/// A message on the validator's work channel.
#[derive(Debug)]
pub enum Work<T> {
    /// A tree to score.
    Tree(Arc<T>),
    /// Tells the worker that takes it to exit.
    Stop,
}


/// The queue-based validator.
///
/// [`Validator::terminate`] sends one [`Work::Stop`] per live worker
/// and then raises a flag, so every worker wakes up and exits
/// even when the channel holds no tree.
/// The last worker out calls
/// [`ValidationObserver::on_validator_terminated`], exactly once.
pub struct Validator<T> {
    sample: Arc<Sample>,
    sender: Mutex<Sender<Work<T>>>,
    receiver: Mutex<Receiver<Work<T>>>,
    terminate: AtomicBool,
    pending: AtomicUsize,
    live: CountDownLatch,
}


impl<T> Validator<T>
    where T: Classifier + Send + Sync + 'static,
{
    /// Construct a new validator over the validation `sample`.
    /// The sample must have at least one row.
    pub fn new(sample: Arc<Sample>) -> Self {
        checker::check_sample(&sample);
        let (sender, receiver) = mpsc::channel();
        Self {
            sample,
            sender: Mutex::new(sender),
            receiver: Mutex::new(receiver),
            terminate: AtomicBool::new(false),
            pending: AtomicUsize::new(0),
            live: CountDownLatch::new(0),
        }
    }


    /// Returns the validation sample.
    pub fn sample(&self) -> &Sample {
        &self.sample
    }


    /// Queue `tree` for scoring. Never blocks.
    pub fn validate_tree(&self, tree: Arc<T>) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.send(Work::Tree(tree));
    }


    /// Score `tree` in the caller thread.
    /// Returns the error rate of `tree` alone;
    /// `score` holds the misclassified rows afterwards.
    pub fn validate(&self, tree: &T, score: &mut Score) -> f64 {
        score_tree(tree, &self.sample, score)
    }


    /// Returns the number of queued trees no worker has taken yet.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }


    /// Returns the number of running workers.
    pub fn live_workers(&self) -> usize {
        self.live.count()
    }


    /// Returns `true` once termination has been requested.
    pub fn is_terminated(&self) -> bool {
        self.terminate.load(Ordering::SeqCst)
    }


    /// Spawn `n_threads` workers reporting to `observer`.
    pub fn start<O>(self: &Arc<Self>, n_threads: usize, observer: Arc<O>)
        -> Vec<JoinHandle<()>>
        where O: ValidationObserver<T> + ?Sized + Send + Sync + 'static,
    {
        checker::check_threads(n_threads);
        // Arm the latch before any worker can finish.
        self.live.add(n_threads);

        (0..n_threads).map(|k| {
                let validator = Arc::clone(self);
                let observer = Arc::clone(&observer);
                thread::Builder::new()
                    .name(format!("validator-{k}"))
                    .spawn(move || validator.work(&*observer))
                    .unwrap_or_else(|e| {
                        panic!("failed to spawn a validator thread: {e}")
                    })
            })
            .collect()
    }


    /// Stop every worker as soon as possible.
    /// Queued trees that no worker has taken yet are dropped.
    /// Returns the number of stop messages sent.
    pub fn terminate(&self) -> usize {
        let n_stops = self.send_stops();
        self.terminate.store(true, Ordering::SeqCst);
        n_stops
    }


    /// Stop every worker once the trees queued so far are scored.
    /// Returns the number of stop messages sent.
    pub fn close(&self) -> usize {
        self.send_stops()
    }


    fn send_stops(&self) -> usize {
        let n_stops = self.live.count();
        for _ in 0..n_stops {
            self.send(Work::Stop);
        }
        log::debug!("sent {n_stops} stop messages to the validator workers");
        n_stops
    }


    fn send(&self, work: Work<T>) {
        let sender = self.sender.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // The receiver lives as long as `self`.
        if sender.send(work).is_err() {
            log::warn!("the validator channel is disconnected");
        }
    }


    fn receiver(&self) -> MutexGuard<'_, Receiver<Work<T>>> {
        self.receiver.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }


    fn work<O>(&self, observer: &O)
        where O: ValidationObserver<T> + ?Sized,
    {
        let n_rows = self.sample.shape().0;
        let mut score = Score::with_capacity(n_rows);

        loop {
            let work = self.receiver().recv();
            let tree = match work {
                Ok(Work::Tree(tree)) => tree,
                Ok(Work::Stop) | Err(_) => break,
            };
            self.pending.fetch_sub(1, Ordering::SeqCst);
            if self.is_terminated() { break; }

            // A failing tree is dropped and the worker moves on.
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                let error = self.validate(&tree, &mut score);
                observer.on_tree_validated(
                    &tree, n_rows, score.bad_rows(), score.bad_votes()
                );
                error
            }));
            match outcome {
                Ok(error) => log::trace!("tree validated, error = {error:.5}"),
                Err(_) => log::warn!("validating a tree panicked; skipped"),
            }
        }

        if self.live.count_down() {
            log::debug!("last validator worker out");
            observer.on_validator_terminated();
        }
    }
}
