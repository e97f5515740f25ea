use rand::rngs::StdRng;

use crate::{Classifier, Result, Sample};


/// The tree-growing collaborator of the builder.
///
/// The builder hands over the rows of a (re)sampled training set
/// and a seeded random number generator;
/// the grower returns an immutable tree.
/// A failure is fatal for the builder worker that asked for the tree.
pub trait TreeGrower: Send + Sync {
    /// The tree produced by this grower.
    type Tree: Classifier + Send + Sync + 'static;


    /// Returns the name of the grower.
    fn name(&self) -> &str;


    /// Returns the parameters of the grower as `(name, value)` pairs.
    fn info(&self) -> Option<Vec<(&str, String)>> {
        None
    }


    /// Grow a tree from the rows `rows` of `sample`.
    /// `rows` may contain repeated indices.
    fn grow(&self, sample: &Sample, rows: &[usize], rng: &mut StdRng)
        -> Result<Self::Tree>;
}
