use polars::prelude::*;
use rayon::prelude::*;
use rand::prelude::*;
use fixedbitset::FixedBitSet;

use crate::{ForestError, Result};
use super::feature::DenseFeature;

use std::collections::HashMap;
use std::ops::Index;


/// Struct `Sample` holds a batch of examples with a class-index target.
///
/// Features are stored column by column.
/// Every row remembers its index in the sample it was cut from,
/// see [`Sample::original_index`].
#[derive(Debug, Clone)]
pub struct Sample {
    pub(super) name_to_index: HashMap<String, usize>,
    pub(super) features: Vec<DenseFeature>,
    pub(super) target: Vec<usize>,
    pub(super) original: Vec<usize>,
    pub(super) n_sample: usize,
    pub(super) n_feature: usize,
    pub(super) n_classes: usize,
}


impl Sample {
    /// Construct a `Sample` from named columns and class indices.
    /// The number of classes is `max(target) + 1`.
    pub fn from_columns<S: ToString>(
        columns: Vec<(S, Vec<f64>)>,
        target: Vec<usize>,
    ) -> Result<Self>
    {
        let features = columns.into_iter()
            .map(|(name, values)| DenseFeature::new(name, values))
            .collect::<Vec<_>>();
        Self::from_features(features, target)
    }


    /// Convert `polars::DataFrame` and `polars::Series` into `Sample`.
    /// This method takes the ownership for `data`.
    /// The target must hold non-negative integral class indices.
    pub fn from_dataframe(data: DataFrame, target: &Series) -> Result<Self> {
        let target = target.cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|y| match y {
                Some(y) if y >= 0 => Ok(y as usize),
                Some(y) => Err(ForestError::InvalidSample(
                    format!("class index must be non-negative. got {y}")
                )),
                None => Err(ForestError::InvalidSample(
                    "the target has a missing value".to_string()
                )),
            })
            .collect::<Result<Vec<_>>>()?;

        let features = data.get_columns()
            .par_iter()
            .map(DenseFeature::from_series)
            .collect::<Result<Vec<_>>>()?;

        Self::from_features(features, target)
    }


    fn from_features(features: Vec<DenseFeature>, target: Vec<usize>)
        -> Result<Self>
    {
        let n_sample = target.len();
        if let Some(feat) = features.iter().find(|f| f.len() != n_sample) {
            return Err(ForestError::InvalidSample(format!(
                "feature `{}` has {} values but the target has {n_sample}",
                feat.name(), feat.len(),
            )));
        }
        let n_classes = target.iter()
            .copied()
            .max()
            .map(|y| y + 1)
            .unwrap_or(0);
        let n_feature = features.len();
        let name_to_index = features.iter()
            .enumerate()
            .map(|(i, f)| (f.name().to_string(), i))
            .collect::<HashMap<_, _>>();
        let original = (0..n_sample).collect::<Vec<_>>();

        let sample = Self {
            name_to_index,
            features,
            target,
            original,
            n_sample,
            n_feature,
            n_classes,
        };
        Ok(sample)
    }


    /// Returns the pair of the number of examples and
    /// the number of features.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_sample, self.n_feature)
    }


    /// Returns the number of classes.
    /// Subsets keep the number of classes of their parent.
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }


    /// Returns the class indices.
    pub fn target(&self) -> &[usize] {
        &self.target[..]
    }


    /// Returns a slice of type `DenseFeature`.
    pub fn features(&self) -> &[DenseFeature] {
        &self.features[..]
    }


    /// Returns the value of the `feature`-th feature at `row`.
    #[inline(always)]
    pub fn value(&self, feature: usize, row: usize) -> f64 {
        self.features[feature][row]
    }


    /// Returns the index of `row` in the sample this one was cut from.
    pub fn original_index(&self, row: usize) -> usize {
        self.original[row]
    }


    /// Returns a new sample made of the given rows.
    /// Rows may repeat.
    pub fn subset(&self, rows: &[usize]) -> Self {
        let features = self.features.par_iter()
            .map(|feat| feat.gather(rows))
            .collect::<Vec<_>>();
        let target = rows.iter()
            .map(|&i| self.target[i])
            .collect::<Vec<_>>();
        let original = rows.iter()
            .map(|&i| self.original[i])
            .collect::<Vec<_>>();

        Self {
            name_to_index: self.name_to_index.clone(),
            features,
            target,
            original,
            n_sample: rows.len(),
            n_feature: self.n_feature,
            n_classes: self.n_classes,
        }
    }


    /// Draw `ceil(ratio * n_sample)` row indices with replacement.
    pub fn bootstrap<R: Rng>(&self, ratio: f64, rng: &mut R) -> Vec<usize> {
        let size = ((self.n_sample as f64 * ratio).ceil() as usize).max(1);
        (0..size).map(|_| rng.gen_range(0..self.n_sample))
            .collect()
    }


    /// Split `self` into a bootstrap sample of the given `ratio`
    /// and its out-of-bag complement.
    pub fn split_out_of_bag(&self, ratio: f64, seed: u64) -> (Self, Self) {
        let mut rng = StdRng::seed_from_u64(seed);
        let bag = self.bootstrap(ratio, &mut rng);

        let mut in_bag = FixedBitSet::with_capacity(self.n_sample);
        bag.iter().for_each(|&i| in_bag.insert(i));

        let out_of_bag = (0..self.n_sample)
            .filter(|&i| !in_bag.contains(i))
            .collect::<Vec<_>>();
        (self.subset(&bag), self.subset(&out_of_bag))
    }


    /// Split `self` into a training part and a validation part.
    /// Every `stride`-th row goes to the validation part.
    pub fn split_holdout(&self, stride: usize) -> (Self, Self) {
        assert!(stride > 1, "holdout stride must be at least 2. got {stride}.");
        let (valid, train): (Vec<usize>, Vec<usize>) = (0..self.n_sample)
            .partition(|i| (i + 1) % stride == 0);
        (self.subset(&train), self.subset(&valid))
    }


    /// Cut `self` into `n_parts` contiguous partitions of almost equal size.
    pub fn partition(&self, n_parts: usize) -> Vec<Self> {
        assert!(n_parts > 0, "cannot cut a sample into zero partitions");
        let base = self.n_sample / n_parts;
        let extra = self.n_sample % n_parts;

        let mut start = 0;
        (0..n_parts).map(|k| {
                let len = base + usize::from(k < extra);
                let rows = (start..start + len).collect::<Vec<_>>();
                start += len;
                self.subset(&rows)
            })
            .collect()
    }
}


impl<S> Index<S> for Sample
    where S: AsRef<str>
{
    type Output = DenseFeature;

    fn index(&self, name: S) -> &Self::Output {
        let name: &str = name.as_ref();
        let k = *self.name_to_index.get(name)
            .unwrap_or_else(|| panic!("The feature named `{name}` does not exist"));
        &self.features[k]
    }
}
