//! Defines the inner representation
//! of the Decision Tree class.
use crate::{Classifier, Sample};

use serde::{Serialize, Deserialize};


/// Enumeration of `BranchNode` and `LeafNode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// A node that have two childrens.
    Branch(BranchNode),


    /// A node that have no child.
    Leaf(LeafNode),
}


/// Represents the branch nodes of decision tree.
/// Rows whose value is less than `threshold` go to the left child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchNode {
    pub(super) feature: usize,
    pub(super) threshold: f64,
    pub(super) left: Box<Node>,
    pub(super) right: Box<Node>,
}


/// Represents the leaf nodes of decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafNode {
    pub(super) class: usize,
}


impl Node {
    /// Construct a leaf node that predicts `class`.
    #[inline]
    pub(super) fn leaf(class: usize) -> Self {
        Self::Leaf(LeafNode { class })
    }


    /// Construct a branch node from the given components.
    #[inline]
    pub(super) fn branch(
        feature: usize,
        threshold: f64,
        left: Node,
        right: Node,
    ) -> Self
    {
        let left = Box::new(left);
        let right = Box::new(right);
        Self::Branch(BranchNode { feature, threshold, left, right })
    }


    /// Returns the depth of the subtree rooted at this node.
    pub(super) fn depth(&self) -> usize {
        match self {
            Node::Branch(b) => 1 + b.left.depth().max(b.right.depth()),
            Node::Leaf(_) => 0,
        }
    }


    /// Returns the number of leaves of the subtree rooted at this node.
    pub(super) fn n_leaves(&self) -> usize {
        match self {
            Node::Branch(b) => b.left.n_leaves() + b.right.n_leaves(),
            Node::Leaf(_) => 1,
        }
    }


    pub(super) fn to_dot_info(&self, id: usize, names: &[&str])
        -> (Vec<String>, usize)
    {
        match self {
            Node::Branch(b) => {
                let feat = names.get(b.feature)
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| format!("Feat. [{}]", b.feature));
                let b_info = format!(
                    "\tnode_{id} [ label = \"{feat} < {thr:.2} ?\" ];\n",
                    thr = b.threshold
                );

                let (l_info, next_id) = b.left.to_dot_info(id + 1, names);
                let (mut r_info, ret_id) = b.right.to_dot_info(next_id, names);

                let mut info = l_info;
                info.push(b_info);
                info.append(&mut r_info);

                let l_edge = format!(
                    "\tnode_{id} -- node_{l_id} [ label = \"Yes\" ];\n",
                    l_id = id + 1
                );
                let r_edge = format!(
                    "\tnode_{id} -- node_{r_id} [ label = \"No\" ];\n",
                    r_id = next_id
                );

                info.push(l_edge);
                info.push(r_edge);

                (info, ret_id)
            },
            Node::Leaf(l) => {
                let info = format!(
                    "\tnode_{id} [ \
                     label = \"class {c}\", \
                     shape = box, \
                     ];\n",
                    c = l.class
                );

                (vec![info], id + 1)
            }
        }
    }
}


impl Classifier for Node {
    #[inline]
    fn predict(&self, sample: &Sample, row: usize) -> usize {
        let mut node = self;
        loop {
            match node {
                Node::Branch(b) => {
                    node = if sample.value(b.feature, row) < b.threshold {
                        &*b.left
                    } else {
                        &*b.right
                    };
                },
                Node::Leaf(l) => return l.class,
            }
        }
    }
}
