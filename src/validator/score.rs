use crate::{Classifier, Sample};


/// Scratch buffer of `(row, predicted class)` pairs
/// for the rows a tree gets wrong.
///
/// A `Score` belongs to exactly one validator worker
/// and is reused for every tree that worker scores,
/// so scoring does not allocate once the buffer has grown to
/// the validation row count.
#[derive(Debug, Default)]
pub struct Score {
    rows: Vec<usize>,
    votes: Vec<usize>,
}


impl Score {
    /// Construct an empty buffer able to hold `n_rows` pairs.
    pub fn with_capacity(n_rows: usize) -> Self {
        Self {
            rows: Vec::with_capacity(n_rows),
            votes: Vec::with_capacity(n_rows),
        }
    }


    /// Forget the pairs of the previous tree.
    #[inline]
    pub fn reset(&mut self) {
        self.rows.clear();
        self.votes.clear();
    }


    /// Record that `row` was classified as `class`.
    #[inline]
    pub fn push(&mut self, row: usize, class: usize) {
        self.rows.push(row);
        self.votes.push(class);
    }


    /// Returns the misclassified rows.
    pub fn bad_rows(&self) -> &[usize] {
        &self.rows[..]
    }


    /// Returns the predicted class of each misclassified row.
    pub fn bad_votes(&self) -> &[usize] {
        &self.votes[..]
    }


    /// Returns the number of misclassified rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }


    /// Returns `true` if the last tree made no mistake.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}


/// Score `tree` on every row of `sample`.
/// On return, `score` holds the rows `tree` gets wrong
/// together with the class it predicted for them.
/// Returns the error rate of `tree` on `sample`.
pub fn score_tree<T>(tree: &T, sample: &Sample, score: &mut Score) -> f64
    where T: Classifier + ?Sized,
{
    score.reset();
    let target = sample.target();
    for (row, &y) in target.iter().enumerate() {
        let class = tree.predict(sample, row);
        if class != y {
            score.push(row, class);
        }
    }

    let n_rows = target.len();
    if n_rows == 0 { 0f64 } else { score.len() as f64 / n_rows as f64 }
}
