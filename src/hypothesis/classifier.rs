use crate::Sample;

use std::sync::Arc;


/// A trait that defines the behavor of a multi-class classifier.
/// You only need to implement `predict` method.
///
/// Trees handed to the pipeline must be immutable once built,
/// since they are shared across threads as `Arc<T>`.
pub trait Classifier {
    /// Predicts the class index of the i'th row of `sample`.
    fn predict(&self, sample: &Sample, row: usize) -> usize;


    /// Predicts the class indices of `sample`.
    fn predict_all(&self, sample: &Sample) -> Vec<usize> {
        let n_sample = sample.shape().0;
        (0..n_sample).map(|row| self.predict(sample, row))
            .collect::<Vec<_>>()
    }


    /// Returns the fraction of the rows of `sample` this classifier
    /// gets wrong.
    fn error_rate(&self, sample: &Sample) -> f64 {
        let n_sample = sample.shape().0;
        if n_sample == 0 { return 0f64; }

        let bad = sample.target()
            .iter()
            .enumerate()
            .filter(|(row, &y)| self.predict(sample, *row) != y)
            .count();
        bad as f64 / n_sample as f64
    }
}


impl<C: Classifier + ?Sized> Classifier for Arc<C> {
    #[inline]
    fn predict(&self, sample: &Sample, row: usize) -> usize {
        (**self).predict(sample, row)
    }
}
