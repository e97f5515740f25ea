//! Defines the decision tree classifier.
use crate::{Classifier, Sample};


use super::node::*;
use serde::{Serialize, Deserialize};

use std::path::Path;
use std::fs::File;
use std::io::prelude::*;


/// Decision tree classifier.
/// This struct is just a wrapper of `Node`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    root: Node,
}


impl From<Node> for DecisionTreeClassifier {
    #[inline]
    fn from(root: Node) -> Self {
        Self { root }
    }
}


impl Classifier for DecisionTreeClassifier {
    #[inline]
    fn predict(&self, sample: &Sample, row: usize) -> usize {
        self.root.predict(sample, row)
    }
}


impl DecisionTreeClassifier {
    /// Returns the depth of the tree.
    /// A single leaf has depth `0`.
    pub fn depth(&self) -> usize {
        self.root.depth()
    }


    /// Returns the number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.root.n_leaves()
    }


    /// Write the current decision tree to dot file.
    /// Branches are labeled with the feature names of `sample`.
    #[inline]
    pub fn to_dot_file<P>(&self, sample: &Sample, path: P)
        -> std::io::Result<()>
        where P: AsRef<Path>
    {
        let names = sample.features()
            .iter()
            .map(|feat| feat.name())
            .collect::<Vec<_>>();

        let mut f = File::create(path)?;
        f.write_all(b"graph DecisionTree {\n")?;

        let info = self.root.to_dot_info(0, &names).0;
        for row in info {
            f.write_all(row.as_bytes())?;
        }

        f.write_all(b"}\n")?;

        Ok(())
    }
}
