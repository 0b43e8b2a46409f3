//! End-to-end tests for the prediction API.

use std::path::PathBuf;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use futures::future::join_all;
use metrics_exporter_prometheus::PrometheusBuilder;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use spamguard::api::{create_router, AppState};
use spamguard::features::{FEATURE_DIM, FEAT_SPAM_MARKERS};
use spamguard::model::{Label, ModelHandle, SpamClassifier, TreeNode};

fn test_classifier() -> SpamClassifier {
    SpamClassifier {
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
    }
}

fn test_handle() -> ModelHandle {
    ModelHandle::new(test_classifier(), PathBuf::from("model.json"))
}

fn empty_state() -> AppState {
    AppState::new(PrometheusBuilder::new().build_recorder().handle())
}

fn loaded_state() -> AppState {
    let state = empty_state();
    state.set_model(test_handle());
    state
}

fn predict_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn health_request() -> Request<Body> {
    Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap()
}

async fn response_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn canonical_spam_message_round_trips() {
    let app = create_router(loaded_state());

    let response = app
        .oneshot(predict_request(json!({"sms": "WIN A FREE PRIZE NOW"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_json(response).await,
        json!({
            "result": "spam",
            "classifier": "decision tree",
            "sms": "WIN A FREE PRIZE NOW"
        })
    );
}

#[tokio::test]
async fn plain_message_classifies_as_ham() {
    let app = create_router(loaded_state());

    let response = app
        .oneshot(predict_request(json!({"sms": "See you at six then"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["result"], "ham");
    assert_eq!(body["sms"], "See you at six then");
}

#[tokio::test]
async fn missing_sms_field_is_a_client_error() {
    let app = create_router(loaded_state());

    let response = app.oneshot(predict_request(json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn empty_sms_is_a_client_error() {
    let app = create_router(loaded_state());

    let response = app
        .oneshot(predict_request(json!({"sms": ""})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrongly_typed_sms_is_a_client_error() {
    let app = create_router(loaded_state());

    let response = app
        .oneshot(predict_request(json!({"sms": 5})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn predict_refuses_until_model_is_published() {
    let app = create_router(empty_state());

    let response = app
        .oneshot(predict_request(json!({"sms": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = response_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn health_flips_when_model_is_published() {
    let state = empty_state();
    let router = create_router(state.clone());

    let before = router.clone().oneshot(health_request()).await.unwrap();
    assert_eq!(before.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = response_json(before).await;
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["model_loaded"], false);
    assert!(body["error"].is_string());

    state.set_model(test_handle());

    let after = router.oneshot(health_request()).await.unwrap();
    assert_eq!(after.status(), StatusCode::OK);
    assert_eq!(
        response_json(after).await,
        json!({"status": "healthy", "model_loaded": true})
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_health_polls_see_only_valid_states() {
    let state = empty_state();
    let router = create_router(state.clone());

    let publisher = {
        let state = state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2)).await;
            state.set_model(test_handle());
        })
    };

    let polls: Vec<_> = (0..50)
        .map(|_| {
            let router = router.clone();
            tokio::spawn(async move {
                let response = router.oneshot(health_request()).await.unwrap();
                let status = response.status();
                (status, response_json(response).await)
            })
        })
        .collect();

    for poll in join_all(polls).await {
        let (status, body) = poll.unwrap();
        if status == StatusCode::OK {
            assert_eq!(body["model_loaded"], true);
        } else if status == StatusCode::SERVICE_UNAVAILABLE {
            assert_eq!(body["model_loaded"], false);
        } else {
            panic!("unexpected health status {status}");
        }
    }

    publisher.await.unwrap();
}

// Metric accounting runs under a local recorder on a current-thread runtime
// so assertions are isolated from other tests in the binary.
#[test]
fn burst_of_requests_releases_gauge_and_books_every_outcome() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    metrics::with_local_recorder(&recorder, || {
        tokio_test::block_on(async {
            let state = AppState::new(handle.clone());
            state.set_model(test_handle());
            let router = create_router(state);

            let requests: Vec<_> = (0..100)
                .map(|i| {
                    let router = router.clone();
                    // 10 malformed bodies in the burst, the rest split
                    // between spam and ham texts.
                    let body = if i % 10 == 0 {
                        json!({})
                    } else if i % 2 == 0 {
                        json!({"sms": "WIN A FREE PRIZE NOW"})
                    } else {
                        json!({"sms": "lunch at noon?"})
                    };
                    async move { router.oneshot(predict_request(body)).await.unwrap() }
                })
                .collect();

            for response in join_all(requests).await {
                assert!(
                    response.status() == StatusCode::OK
                        || response.status() == StatusCode::BAD_REQUEST
                );
            }
        });
    });

    let rendered = handle.render();
    assert!(rendered.contains("predict_requests_in_flight 0"));
    assert!(rendered.contains("predict_request_duration_seconds_count 100"));
    assert!(rendered.contains("predictions_total{result=\"spam\"} 40"));
    assert!(rendered.contains("predictions_total{result=\"ham\"} 50"));
    assert!(rendered.contains("predictions_total{result=\"error\"} 10"));
}

#[test]
fn metrics_exposition_reports_families_after_traffic() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    metrics::with_local_recorder(&recorder, || {
        tokio_test::block_on(async {
            let state = AppState::new(handle.clone());
            state.set_model(test_handle());
            let router = create_router(state);

            router
                .clone()
                .oneshot(predict_request(json!({"sms": "WIN A FREE PRIZE NOW"})))
                .await
                .unwrap();

            let response = router
                .oneshot(
                    Request::builder()
                        .uri("/metrics")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let text = String::from_utf8(bytes.to_vec()).unwrap();
            assert!(text.contains("predictions_total{result=\"spam\"} 1"));
            assert!(text.contains("predict_requests_in_flight 0"));
            assert!(text.contains("predict_request_duration_seconds"));
        });
    });
}
