use serde::{Serialize, Deserialize};

use crate::{constants::*, ForestError, Result};

use std::fs;
use std::path::Path;


/// Settings of a single-process forest run.
///
/// Every field has a default, so a JSON file only needs to name
/// the fields it changes:
/// ```
/// use miniforest::ForestConfig;
///
/// let config = ForestConfig::from_json_str(
///     r#"{ "n_trees": 20, "validator_threads": 4 }"#
/// ).unwrap();
/// assert_eq!(config.get_n_trees(), 20);
/// assert_eq!(config.get_builder_threads(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    n_trees: usize,
    builder_threads: usize,
    validator_threads: usize,
    sample_ratio: f64,
    seed: u64,
}


impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: DEFAULT_N_TREES,
            builder_threads: DEFAULT_BUILDER_THREADS,
            validator_threads: DEFAULT_VALIDATOR_THREADS,
            sample_ratio: DEFAULT_SAMPLE_RATIO,
            seed: DEFAULT_SEED,
        }
    }
}


impl ForestConfig {
    /// Construct a config with the default values.
    pub fn new() -> Self {
        Self::default()
    }


    /// Parse a config from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }


    /// Read a config from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }


    /// Set the number of trees to grow.
    pub fn n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }


    /// Set the number of builder threads.
    pub fn builder_threads(mut self, n_threads: usize) -> Self {
        self.builder_threads = n_threads;
        self
    }


    /// Set the number of validator threads.
    pub fn validator_threads(mut self, n_threads: usize) -> Self {
        self.validator_threads = n_threads;
        self
    }


    /// Set the bootstrap ratio, in `(0, 1]`.
    pub fn sample_ratio(mut self, ratio: f64) -> Self {
        self.sample_ratio = ratio;
        self
    }


    /// Set the seed of the randomness.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }


    /// Returns the number of trees to grow.
    pub fn get_n_trees(&self) -> usize {
        self.n_trees
    }


    /// Returns the number of builder threads.
    pub fn get_builder_threads(&self) -> usize {
        self.builder_threads
    }


    /// Returns the number of validator threads.
    pub fn get_validator_threads(&self) -> usize {
        self.validator_threads
    }


    /// Returns the bootstrap ratio.
    pub fn get_sample_ratio(&self) -> f64 {
        self.sample_ratio
    }


    /// Returns the seed.
    pub fn get_seed(&self) -> u64 {
        self.seed
    }


    /// Check the consistency of the settings.
    pub fn check(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(invalid("`n_trees` must be positive"));
        }
        if self.builder_threads == 0 {
            return Err(invalid("`builder_threads` must be positive"));
        }
        if self.validator_threads == 0 {
            return Err(invalid("`validator_threads` must be positive"));
        }
        if !(self.sample_ratio > 0f64 && self.sample_ratio <= 1f64) {
            return Err(invalid("`sample_ratio` must be in (0, 1]"));
        }
        Ok(())
    }
}


#[inline]
pub(crate) fn invalid(message: &str) -> ForestError {
    ForestError::InvalidConfig(message.to_string())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid_01() {
        assert!(ForestConfig::new().check().is_ok());
    }

    #[test]
    fn test_check_02() {
        let res = ForestConfig::new().validator_threads(0).check();
        assert!(matches!(res, Err(ForestError::InvalidConfig(_))));
        let res = ForestConfig::new().sample_ratio(0.0).check();
        assert!(matches!(res, Err(ForestError::InvalidConfig(_))));
        let res = ForestConfig::new().sample_ratio(1.5).check();
        assert!(matches!(res, Err(ForestError::InvalidConfig(_))));
    }

    #[test]
    fn test_json_03() {
        let config = ForestConfig::from_json_str(
            r#"{ "n_trees": 7, "seed": 99 }"#
        ).unwrap();
        let exp = ForestConfig::new().n_trees(7).seed(99);
        assert_eq!(config, exp);

        let res = ForestConfig::from_json_str(r#"{ "builder_threads": 0 }"#);
        assert!(res.is_err());
    }
}
