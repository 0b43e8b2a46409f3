//! Synchronous classification over the shared model handle.

use serde::Serialize;
use tracing::debug;

use crate::error::InferenceError;
use crate::features::FeatureVector;
use crate::model::{Label, ModelHandle};

/// Outcome of classifying one message.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// The assigned label.
    pub label: Label,
    /// Name of the classifier that produced it.
    pub classifier: String,
}

/// Classify one feature vector against the loaded model.
///
/// Reads the handle and never mutates it, so any number of request tasks may
/// call this concurrently. Batch size is one by design.
pub fn classify(
    handle: &ModelHandle,
    features: &FeatureVector,
) -> Result<Prediction, InferenceError> {
    let classifier = handle.classifier();
    let label = classifier.predict(features)?;

    debug!(label = %label, classifier = %classifier.name, "Classified message");

    Ok(Prediction {
        label,
        classifier: classifier.name.clone(),
    })
}
