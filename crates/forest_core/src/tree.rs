//! Regression tree structures
//!
//! Trees are stored as flat node arrays with node 0 as the root.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes `feature_idx >= 0` and `left`/`right` index into the
/// owning tree's node array. Leaf nodes carry `feature_idx == -1`, `-1`
/// children and a `leaf` value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: i32,
    pub left: i32,
    pub right: i32,
    pub feature_idx: i32,
    /// Rows with `feature <= threshold` go left
    pub threshold: f64,
    pub leaf: Option<f64>,
    /// Training rows that reached this node
    pub samples: usize,
}

impl Node {
    pub fn internal(
        id: i32,
        feature_idx: i32,
        threshold: f64,
        left: i32,
        right: i32,
        samples: usize,
    ) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
            samples,
        }
    }

    pub fn leaf(id: i32, value: f64, samples: usize) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
            samples,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }
}

/// A single regression tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Evaluate this tree on a feature vector.
    ///
    /// Returns `None` if the walk leaves the node array or asks for a
    /// feature the row does not have.
    pub fn evaluate(&self, features: &[f64]) -> Option<f64> {
        let mut idx = 0usize;

        loop {
            let node = self.nodes.get(idx)?;

            if node.is_leaf() {
                return node.leaf;
            }

            let value = *features.get(node.feature_idx as usize)?;
            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };
            if next < 0 {
                return None;
            }
            idx = next as usize;
        }
    }

    /// Depth of the deepest leaf (a lone root leaf has depth 0)
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(node) if !node.is_leaf() => {
                    1 + walk(nodes, node.left as usize).max(walk(nodes, node.right as usize))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Validate tree structure
    pub fn validate(&self, feature_count: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                match node.leaf {
                    Some(v) if v.is_finite() => {}
                    Some(v) => return Err(format!("Leaf node {} has non-finite value {}", i, v)),
                    None => return Err(format!("Leaf node {} has no leaf value", i)),
                }
                continue;
            }

            // Children always come after their parent, which rules out cycles
            for child in [node.left, node.right] {
                if child <= i as i32 || child as usize >= self.nodes.len() {
                    return Err(format!("Node {} has invalid child: {}", i, child));
                }
            }

            if node.feature_idx < 0 || node.feature_idx as usize >= feature_count {
                return Err(format!(
                    "Internal node {} has invalid feature index: {}",
                    i, node.feature_idx
                ));
            }

            if !node.threshold.is_finite() {
                return Err(format!("Internal node {} has non-finite threshold", i));
            }
        }

        Ok(())
    }
}
