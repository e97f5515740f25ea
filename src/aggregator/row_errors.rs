use crate::{ForestError, Result};


/// Returns the largest number of wrong votes a row can receive
/// from `n_trees` trees and still be classified correctly
/// by their majority.
/// Ties count as wrong, so an even ensemble tolerates one vote less.
/// Returns `-1` for an empty ensemble.
#[inline]
pub fn max_bad(n_trees: usize) -> i64 {
    let mut max_bad = (n_trees / 2) as i64;
    if n_trees % 2 == 0 {
        max_bad -= 1;
    }
    max_bad
}


/// The simple per-row error counter.
///
/// Counts, for every row, the trees that misclassify it,
/// without remembering which wrong class they picked.
/// Suited to two-class problems,
/// where "wrong" names exactly one class.
#[derive(Debug, Clone)]
pub struct RowErrorCounts {
    counts: Vec<u32>,
}


impl RowErrorCounts {
    /// Construct a counter for `n_rows` rows.
    pub fn new(n_rows: usize) -> Self {
        Self { counts: vec![0; n_rows] }
    }


    /// Count one more mistake on each of `bad_rows`.
    /// Fails without counting anything if a row is out of range.
    pub fn record(&mut self, bad_rows: &[usize]) -> Result<()> {
        let n_rows = self.counts.len();
        if let Some(&row) = bad_rows.iter().find(|&&r| r >= n_rows) {
            return Err(ForestError::RowOutOfRange { row, n_rows });
        }
        bad_rows.iter().for_each(|&r| self.counts[r] += 1);
        Ok(())
    }


    /// Returns the number of mistakes counted on `row`.
    pub fn count(&self, row: usize) -> u32 {
        self.counts[row]
    }


    /// Returns the error of the majority vote of `n_trees` trees,
    /// or `-1.0` when there is no tree or no row.
    pub fn error(&self, n_trees: usize) -> f64 {
        if n_trees == 0 || self.counts.is_empty() { return -1f64; }

        let max_bad = max_bad(n_trees);
        let errors = self.counts.iter()
            .filter(|&&c| c as i64 > max_bad)
            .count();
        errors as f64 / self.counts.len() as f64
    }
}
