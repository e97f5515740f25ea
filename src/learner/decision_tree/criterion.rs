//! Splitting criteria for growing a multi-class decision tree.

use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use std::fmt;
use std::cmp::Ordering;

use crate::Sample;


/// Score for a splitting.
/// This is just a wrapper for `f64`.
/// Smaller is better.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(super) struct Score(f64);


impl From<f64> for Score {
    #[inline(always)]
    fn from(score: f64) -> Self {
        Self(score)
    }
}


impl PartialOrd for Score {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}


/// A splitting rule found by [`Criterion::best_split`].
#[derive(Copy, Clone, Debug)]
pub(super) struct Split {
    pub(super) feature: usize,
    pub(super) threshold: f64,
    pub(super) score: Score,
}


/// Splitting criteria for growing decision tree.
/// * `Criterion::Entropy` minimizes entropic impurity.
/// * `Criterion::Gini` minimizes Gini impurity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criterion {
    /// Entropy.
    Entropy,
    /// Gini index.
    Gini,
}


impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Entropy => "Entropy",
            Self::Gini => "Gini index",
        };

        write!(f, "{name}")
    }
}


impl Criterion {
    /// Returns the impurity of a node with the given class counts.
    #[inline]
    pub(super) fn impurity(&self, counts: &[f64]) -> f64 {
        match self {
            Self::Entropy => entropic_impurity(counts),
            Self::Gini => gini_impurity(counts),
        }
    }


    /// Returns the best splitting rule over `features`
    /// for the examples `rows` of `sample`.
    /// Returns `None` if no feature separates the rows.
    pub(super) fn best_split(
        &self,
        sample: &Sample,
        rows: &[usize],
        features: &[usize],
    ) -> Option<Split>
    {
        features.par_iter()
            .filter_map(|&feature| self.split_at(sample, rows, feature))
            .min_by(|x, y| {
                x.score.partial_cmp(&y.score)
                    .unwrap_or(Ordering::Equal)
                    .then(x.feature.cmp(&y.feature))
            })
    }


    /// Sweep the sorted values of `feature`,
    /// moving one example at a time from right to left.
    fn split_at(&self, sample: &Sample, rows: &[usize], feature: usize)
        -> Option<Split>
    {
        let n_classes = sample.n_classes();
        let target = sample.target();
        let mut pack = rows.iter()
            .map(|&i| (sample.value(feature, i), target[i]))
            .collect::<Vec<_>>();
        pack.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = pack.len() as f64;
        let mut left = vec![0f64; n_classes];
        let mut right = vec![0f64; n_classes];
        pack.iter().for_each(|(_, y)| right[*y] += 1f64);


        let mut best: Option<Split> = None;
        for k in 0..pack.len().saturating_sub(1) {
            let (value, y) = pack[k];
            left[y] += 1f64;
            right[y] -= 1f64;

            let next = pack[k + 1].0;
            if value == next { continue; }

            let lp = (k + 1) as f64 / total;
            let rp = 1f64 - lp;
            let score = lp * self.impurity(&left) + rp * self.impurity(&right);
            let score = Score::from(score);

            if best.map_or(true, |b| score < b.score) {
                let threshold = value + (next - value) / 2f64;
                best = Some(Split { feature, threshold, score });
            }
        }
        best
    }
}


/// Returns the entropic-impurity of the given counts.
#[inline(always)]
fn entropic_impurity(counts: &[f64]) -> f64 {
    let total = counts.iter().sum::<f64>();
    if total <= 0f64 { return 0f64; }

    counts.iter()
        .map(|&c| {
            let r = c / total;
            if r <= 0f64 { 0f64 } else { -r * r.ln() }
        })
        .sum::<f64>()
}


/// Returns the gini-impurity of the given counts.
#[inline(always)]
fn gini_impurity(counts: &[f64]) -> f64 {
    let total = counts.iter().sum::<f64>();
    if total <= 0f64 { return 0f64; }

    let correct = counts.iter()
        .map(|&c| (c / total).powi(2))
        .sum::<f64>();

    (1f64 - correct).max(0f64)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gini_pure_01() {
        let res = gini_impurity(&[0.0, 4.0, 0.0]);
        assert_eq!(res, 0.0, "expected 0, got {res}.");
    }

    #[test]
    fn test_gini_uniform_02() {
        let res = gini_impurity(&[2.0, 2.0]);
        assert!((res - 0.5).abs() < 1e-12, "expected 0.5, got {res}.");
    }

    #[test]
    fn test_entropy_uniform_01() {
        let res = entropic_impurity(&[1.0, 1.0]);
        let exp = 2f64.ln();
        assert!((res - exp).abs() < 1e-12, "expected {exp}, got {res}.");
    }

    #[test]
    fn test_best_split_01() {
        let sample = Sample::from_columns(
            vec![
                ("noise", vec![1.0, 1.0, 1.0, 1.0]),
                ("x", vec![0.0, 1.0, 10.0, 11.0]),
            ],
            vec![0, 0, 1, 1],
        ).unwrap();
        let rows = [0, 1, 2, 3];
        let split = Criterion::Gini.best_split(&sample, &rows, &[0, 1])
            .expect("a separating split exists");
        assert_eq!(split.feature, 1);
        assert_eq!(split.threshold, 5.5);
        assert_eq!(split.score, Score::from(0.0));
    }

    #[test]
    fn test_best_split_constant_feature_02() {
        let sample = Sample::from_columns(
            vec![("noise", vec![1.0, 1.0, 1.0])],
            vec![0, 1, 1],
        ).unwrap();
        let res = Criterion::Entropy.best_split(&sample, &[0, 1, 2], &[0]);
        assert!(res.is_none(), "expected no split, got {res:?}.");
    }
}
