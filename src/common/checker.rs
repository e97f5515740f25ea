//! This file defines some functions that checks some pre-conditions
//! E.g., Shape of data

use crate::Sample;


/// Check whether the given sample can be used to grow or score trees.
#[inline(always)]
pub(crate) fn check_sample(sample: &Sample) {
    let (n_sample, n_feature) = sample.shape();

    // A validation pass over zero rows has no defined error rate.
    assert!(n_sample > 0, "the sample has no rows");

    // `data` must have a feature.
    assert!(n_feature > 0, "the sample has no feature");
}


/// Check the bootstrap ratio.
#[inline(always)]
pub(crate) fn check_sample_ratio(ratio: f64) {
    assert!(
        0f64 < ratio && ratio <= 1f64,
        "sample ratio must be in (0, 1]. got {ratio}."
    );
}


/// Check the number of worker threads.
#[inline(always)]
pub(crate) fn check_threads(n_threads: usize) {
    assert!(n_threads > 0, "at least one worker thread is required");
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_ratio_success_01() {
        check_sample_ratio(1f64);
    }

    #[test]
    fn test_sample_ratio_success_02() {
        check_sample_ratio(0.666);
    }

    #[test]
    #[should_panic]
    fn test_sample_ratio_failure_01() {
        check_sample_ratio(0f64);
    }

    #[test]
    #[should_panic]
    fn test_sample_ratio_failure_02() {
        check_sample_ratio(1.0001);
    }

    #[test]
    #[should_panic]
    fn test_threads_failure_01() {
        check_threads(0);
    }
}
