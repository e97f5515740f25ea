//! Per-role callbacks that bind the pipeline stages together.

use crate::Result;

use std::sync::{Arc, Weak};


/// Receives the trees a [`TreeBuilder`](crate::TreeBuilder) grows.
pub trait BuildObserver<T> {
    /// Called once per grown tree, from the builder worker that grew it.
    /// An `Err` stops the builder.
    fn on_tree_built(&self, tree: Arc<T>) -> Result<()>;


    /// Called exactly once, by the last builder worker to exit.
    fn on_builder_terminated(&self);
}


/// Receives the outcome of scoring a tree on validation data.
pub trait ValidationObserver<T> {
    /// Called once per scored tree.
    /// `bad_rows[i]` is a row `tree` gets wrong
    /// and `bad_votes[i]` the class it predicted there.
    /// The slices are only valid for the duration of the call.
    fn on_tree_validated(
        &self,
        tree: &Arc<T>,
        n_rows: usize,
        bad_rows: &[usize],
        bad_votes: &[usize],
    );


    /// Called exactly once, by the last validator worker to exit.
    fn on_validator_terminated(&self);
}


/// Receives the ensemble size and error after every aggregation
/// that changed them.
pub trait AggregationObserver {
    /// `error` is `-1.0` while no tree has made a mistake.
    fn on_aggregator_change(&self, n_trees: usize, error: f64);
}


// An aggregator owned by its own observer holds it weakly.
impl<O> AggregationObserver for Weak<O>
    where O: AggregationObserver + ?Sized,
{
    fn on_aggregator_change(&self, n_trees: usize, error: f64) {
        if let Some(observer) = self.upgrade() {
            observer.on_aggregator_change(n_trees, error);
        }
    }
}


impl<O> AggregationObserver for Arc<O>
    where O: AggregationObserver + ?Sized,
{
    fn on_aggregator_change(&self, n_trees: usize, error: f64) {
        (**self).on_aggregator_change(n_trees, error);
    }
}
