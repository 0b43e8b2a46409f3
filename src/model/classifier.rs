//! Decision-tree classifier deserialized from the model artifact.

use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;

use crate::error::InferenceError;

/// Binary classification label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Label {
    /// Unsolicited message.
    Spam,
    /// Legitimate message.
    Ham,
}

impl Label {
    /// Static lowercase name, usable as a metric label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Label::Spam => "spam",
            Label::Ham => "ham",
        }
    }
}

/// One node of the array-encoded decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TreeNode {
    /// Interior split: go left when `features[feature] < threshold`.
    Split {
        /// Feature slot the split reads.
        feature: usize,
        /// Split threshold.
        threshold: f32,
        /// Node index taken when the feature is below the threshold.
        left: usize,
        /// Node index taken otherwise.
        right: usize,
    },
    /// Terminal node carrying the decision.
    Leaf {
        /// The decision.
        label: Label,
    },
}

/// A pre-trained decision-tree classifier.
///
/// The tree is array-encoded with node 0 as the root and all child references
/// pointing strictly forward, which [`validate`](Self::validate) enforces at
/// load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpamClassifier {
    /// Human-readable classifier name, echoed in prediction responses.
    pub name: String,
    /// Feature vector width the tree was trained on.
    pub n_features: usize,
    /// Array-encoded tree nodes.
    pub tree: Vec<TreeNode>,
}

impl SpamClassifier {
    /// Classify one feature vector.
    ///
    /// The walk is bounded by the node count, so even an unvalidated artifact
    /// yields `InvalidNode` rather than looping forever.
    pub fn predict(&self, features: &[f32]) -> Result<Label, InferenceError> {
        if features.len() != self.n_features {
            return Err(InferenceError::FeatureMismatch {
                expected: self.n_features,
                got: features.len(),
            });
        }

        let mut index = 0usize;
        for _ in 0..self.tree.len() {
            match self.tree.get(index) {
                Some(TreeNode::Leaf { label }) => return Ok(*label),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = match features.get(*feature) {
                        Some(v) => *v,
                        None => return Err(InferenceError::InvalidNode { index }),
                    };
                    // NaN comparisons are false, so NaN routes right.
                    index = if value < *threshold { *left } else { *right };
                }
                None => return Err(InferenceError::InvalidNode { index }),
            }
        }

        // More steps than nodes means the tree has a cycle.
        Err(InferenceError::InvalidNode { index })
    }

    /// Check structural integrity of the tree.
    ///
    /// Enforces: non-empty tree, split features within `n_features`, finite
    /// thresholds, and child references that are in bounds and strictly
    /// forward (which rules out cycles).
    pub fn validate(&self) -> Result<(), String> {
        if self.tree.is_empty() {
            return Err("tree is empty".to_string());
        }

        for (i, node) in self.tree.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                if *feature >= self.n_features {
                    return Err(format!(
                        "node {i} splits on feature {feature}, classifier expects {} features",
                        self.n_features
                    ));
                }
                if !threshold.is_finite() {
                    return Err(format!("node {i} has non-finite threshold"));
                }
                for child in [*left, *right] {
                    if child >= self.tree.len() {
                        return Err(format!("node {i} references missing node {child}"));
                    }
                    if child <= i {
                        return Err(format!("node {i} references backward node {child}"));
                    }
                }
            }
        }

        Ok(())
    }
}
