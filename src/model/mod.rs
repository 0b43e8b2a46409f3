//! Model module for the spam classifier.
//!
//! This module handles:
//! - The decision-tree classifier and its artifact schema
//! - Artifact acquisition (local load or one-time download)
//! - The immutable handle shared with the request path

pub mod classifier;
pub mod store;

pub use classifier::{Label, SpamClassifier, TreeNode};
pub use store::{ModelHandle, ModelStore};
