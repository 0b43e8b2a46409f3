//! Unified error types for the spam classification gateway.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unified error type for the gateway.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Model acquisition or loading error.
    #[error("model error: {0}")]
    Model(#[from] ModelStoreError),

    /// Classification error.
    #[error("inference error: {0}")]
    Inference(#[from] InferenceError),

    /// Metrics recorder installation error.
    #[error("metrics error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Model artifact acquisition and loading errors.
///
/// Every variant is fatal for startup: the gateway never serves predictions
/// without a loaded model.
#[derive(Error, Debug)]
pub enum ModelStoreError {
    /// No local artifact and no download source configured.
    #[error(
        "no model found at {} and no MODEL_URL provided; mount a model volume or set the MODEL_URL environment variable",
        path.display()
    )]
    NoSource {
        /// Path that was checked for a local artifact.
        path: PathBuf,
    },

    /// Artifact download failed at the transport level.
    #[error("failed to download model from {url}: {source}")]
    Download {
        /// Source URL of the attempted download.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Artifact download returned a non-success status.
    #[error("model download from {url} returned status {status}")]
    DownloadStatus {
        /// Source URL of the attempted download.
        url: String,
        /// HTTP status returned by the source.
        status: reqwest::StatusCode,
    },

    /// Local artifact could not be read.
    #[error("failed to read model at {}: {source}", path.display())]
    Read {
        /// Path of the unreadable artifact.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Local artifact is not valid JSON.
    #[error("failed to parse model at {}: {source}", path.display())]
    Parse {
        /// Path of the malformed artifact.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Artifact parsed but failed structural validation.
    #[error("model at {} is invalid: {reason}", path.display())]
    Invalid {
        /// Path of the rejected artifact.
        path: PathBuf,
        /// Which structural check failed.
        reason: String,
    },

    /// IO error outside the read path (directory creation, artifact write).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classification errors.
///
/// `FeatureMismatch` is a caller problem and maps to a client error;
/// `InvalidNode` means the loaded model is structurally broken and maps to a
/// server error. The two must stay distinguishable so malformed input is
/// never booked as an infrastructure failure.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// Feature vector width does not match the classifier.
    #[error("feature vector has {got} features, classifier expects {expected}")]
    FeatureMismatch {
        /// Width the classifier was trained with.
        expected: usize,
        /// Width actually supplied.
        got: usize,
    },

    /// Tree walk reached an out-of-bounds node reference.
    #[error("classifier tree references invalid node {index}")]
    InvalidNode {
        /// The out-of-bounds node index.
        index: usize,
    },
}

/// Errors on the prediction request path.
#[derive(Error, Debug)]
pub enum PredictError {
    /// Request body was not parseable as the expected JSON shape.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// The `sms` field was absent or empty.
    #[error("no SMS provided")]
    MissingSms,

    /// Prediction requested before the model handle was published.
    #[error("model not loaded")]
    ModelNotReady,

    /// Classification failed.
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl PredictError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            PredictError::InvalidBody(_) | PredictError::MissingSms => StatusCode::BAD_REQUEST,
            PredictError::ModelNotReady => StatusCode::SERVICE_UNAVAILABLE,
            PredictError::Inference(InferenceError::FeatureMismatch { .. }) => {
                StatusCode::BAD_REQUEST
            }
            PredictError::Inference(InferenceError::InvalidNode { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ServiceError>;
