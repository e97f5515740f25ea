use polars::prelude::*;

use crate::{ForestError, Result};

use std::ops::Index;


/// Dense representation of a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseFeature {
    /// Feature name
    pub name: String,
    /// Feature values.
    pub sample: Vec<f64>,
}


impl DenseFeature {
    /// Construct a dense feature with `name` from the given values.
    pub fn new<T: ToString>(name: T, sample: Vec<f64>) -> Self {
        Self { name: name.to_string(), sample, }
    }


    /// Get the feature name.
    pub fn name(&self) -> &str {
        &self.name
    }


    /// Convert `polars::Series` into `DenseFeature`.
    /// Numeric columns of any dtype are cast to `f64`.
    pub fn from_series(series: &Series) -> Result<Self> {
        let name = series.name().to_string();

        let sample = series.cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                ForestError::InvalidSample(
                    format!("feature `{name}` has a missing value")
                )
            })?;

        Ok(Self { name, sample, })
    }


    /// Returns the values at `rows`, in order.
    pub(crate) fn gather(&self, rows: &[usize]) -> Self {
        let sample = rows.iter()
            .map(|&i| self.sample[i])
            .collect::<Vec<_>>();
        Self { name: self.name.clone(), sample, }
    }


    /// Returns the number of items in `self.sample`.
    pub fn len(&self) -> usize {
        self.sample.len()
    }


    /// Returns `true` if the feature holds no value.
    pub fn is_empty(&self) -> bool {
        self.sample.is_empty()
    }
}


impl Index<usize> for DenseFeature {
    type Output = f64;
    fn index(&self, idx: usize) -> &Self::Output {
        &self.sample[idx]
    }
}
