//! HTTP API handlers.

use std::sync::{Arc, OnceLock};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::error::PredictError;
use crate::features;
use crate::inference;
use crate::metrics;
use crate::model::{Label, ModelHandle};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Single-assignment slot for the loaded model. Written once by startup,
    /// read lock-free by every request afterwards.
    model: Arc<OnceLock<ModelHandle>>,
    /// Render handle for the Prometheus exposition endpoint.
    metrics: PrometheusHandle,
}

impl AppState {
    /// Create new app state with no model loaded.
    pub fn new(metrics: PrometheusHandle) -> Self {
        Self {
            model: Arc::new(OnceLock::new()),
            metrics,
        }
    }

    /// Publish the loaded model. Returns false if a handle was already set.
    pub fn set_model(&self, handle: ModelHandle) -> bool {
        self.model.set(handle).is_ok()
    }

    /// The loaded model, if published.
    pub fn model(&self) -> Option<&ModelHandle> {
        self.model.get()
    }

    /// Whether the model handle has been published.
    pub fn model_loaded(&self) -> bool {
        self.model.get().is_some()
    }
}

/// Prediction request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PredictRequest {
    /// The SMS text to classify.
    #[schema(example = "This is an example of an SMS.")]
    pub sms: Option<String>,
}

/// Prediction response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct PredictResponse {
    /// Assigned label.
    pub result: Label,
    /// Name of the classifier that produced the result.
    #[schema(example = "decision tree")]
    pub classifier: String,
    /// The classified text, echoed back unmodified.
    pub sms: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy".
    pub status: &'static str,
    /// Whether the model handle has been published.
    pub model_loaded: bool,
    /// Detail, present only when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Prediction handler.
#[utoipa::path(
    post,
    path = "/predict",
    tag = "predict",
    request_body = PredictRequest,
    responses(
        (status = 200, description = "Message classified", body = PredictResponse),
        (status = 400, description = "Missing or malformed SMS payload"),
        (status = 503, description = "Model not loaded yet")
    ),
    operation_id = "predict"
)]
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, PredictError> {
    // Tracked from the first byte of handling: rejected bodies and
    // not-ready refusals still release the gauge and book latency.
    let guard = metrics::begin_request();

    let Json(request) =
        payload.map_err(|rejection| PredictError::InvalidBody(rejection.body_text()))?;

    let sms = match request.sms {
        Some(sms) if !sms.is_empty() => sms,
        _ => return Err(PredictError::MissingSms),
    };

    let handle = state.model().ok_or(PredictError::ModelNotReady)?;

    let features = features::prepare(&sms);
    let prediction = inference::classify(handle, &features)?;

    let outcome = prediction.label.as_str();
    info!(
        result = outcome,
        latency_us = guard.elapsed().as_micros() as u64,
        "Prediction served"
    );
    guard.complete(outcome);

    Ok(Json(PredictResponse {
        result: prediction.label,
        classifier: prediction.classifier,
        sms,
    }))
}

/// Compute health from model handle presence.
///
/// Total: never fails, never runs a prediction. Health is presence of the
/// handle and nothing else.
pub fn health_state(model: Option<&ModelHandle>) -> (StatusCode, HealthResponse) {
    match model {
        Some(_) => (
            StatusCode::OK,
            HealthResponse {
                status: "healthy",
                model_loaded: true,
                error: None,
            },
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            HealthResponse {
                status: "unhealthy",
                model_loaded: false,
                error: Some("Model not loaded".to_string()),
            },
        ),
    }
}

/// Health check handler - 200 once the model is loaded, 503 before.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Model loaded, ready to serve", body = HealthResponse),
        (status = 503, description = "Model not loaded", body = HealthResponse)
    ),
    operation_id = "health"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let (status, body) = health_state(state.model());
    (status, Json(body))
}

/// Prometheus metrics endpoint.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "health",
    responses(
        (status = 200, description = "Prometheus text exposition", body = String)
    ),
    operation_id = "metrics"
)]
pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FEATURE_DIM, FEAT_SPAM_MARKERS};
    use crate::model::{SpamClassifier, TreeNode};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::path::PathBuf;

    fn test_state() -> AppState {
        AppState::new(PrometheusBuilder::new().build_recorder().handle())
    }

    fn test_handle() -> ModelHandle {
        let classifier = SpamClassifier {
            name: "decision tree".to_string(),
            n_features: FEATURE_DIM,
            tree: vec![
                TreeNode::Split {
                    feature: FEAT_SPAM_MARKERS,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { label: Label::Ham },
                TreeNode::Leaf { label: Label::Spam },
            ],
        };
        ModelHandle::new(classifier, PathBuf::from("model.json"))
    }

    #[test]
    fn app_state_publishes_model_once() {
        let state = test_state();
        assert!(!state.model_loaded());

        assert!(state.set_model(test_handle()));
        assert!(state.model_loaded());

        // Second publication is refused, the first handle stays.
        assert!(!state.set_model(test_handle()));
        assert!(state.model_loaded());
    }

    #[test]
    fn health_state_unhealthy_without_model() {
        let (status, body) = health_state(None);

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "unhealthy");
        assert!(!body.model_loaded);
        assert_eq!(body.error.as_deref(), Some("Model not loaded"));
    }

    #[test]
    fn health_state_healthy_with_model() {
        let handle = test_handle();

        let (status, body) = health_state(Some(&handle));

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "healthy");
        assert!(body.model_loaded);
        assert!(body.error.is_none());
    }

    #[test]
    fn health_response_omits_error_when_healthy() {
        let (_, body) = health_state(Some(&test_handle()));

        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"status":"healthy","model_loaded":true}"#);
    }
}
