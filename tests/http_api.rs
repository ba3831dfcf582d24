//! End-to-end tests over the full router with a scripted generator.
//!
//! These exercise the same middleware stack and routes as production; only
//! the provider client is substituted, so no network access is needed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use imageburst::app_state::AppState;
use imageburst::routes;
use imageburst::services::gemini::{GenerateError, GenerationParams, ImageGenerator};
use imageburst::services::store::JobStore;

const IMAGE_URI: &str = "data:image/png;base64,c3R1Yg==";

/// Generator that resolves after a short delay, optionally always failing.
struct StubGenerator {
    delay: Duration,
    fail_with: Option<String>,
}

impl StubGenerator {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            delay: Duration::from_millis(5),
            fail_with: None,
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            delay: Duration::from_millis(5),
            fail_with: Some(message.to_string()),
        })
    }
}

#[async_trait]
impl ImageGenerator for StubGenerator {
    async fn generate(&self, _params: &GenerationParams) -> Result<String, GenerateError> {
        tokio::time::sleep(self.delay).await;
        match &self.fail_with {
            Some(message) => Err(GenerateError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(IMAGE_URI.to_string()),
        }
    }
}

fn test_app(generator: Arc<dyn ImageGenerator>) -> (Router, Arc<JobStore>) {
    let store = Arc::new(JobStore::new());
    let state = AppState {
        store: Arc::clone(&store),
        generator,
    };
    (routes::app(state), store)
}

fn submit_body() -> Value {
    json!({
        "prompt": "a watercolor fox in the snow",
        "imageCount": 3,
        "concurrency": 2,
        "temperature": 1.0
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn poll_until_terminal(app: &Router, job_id: &str) -> Value {
    for _ in 0..500 {
        let (status, body) = get_json(app, &format!("/api/v1/jobs/{job_id}")).await;
        assert_eq!(status, StatusCode::OK);
        match body["status"].as_str().unwrap() {
            "complete" | "error" => return body,
            _ => tokio::time::sleep(Duration::from_millis(5)).await,
        }
    }
    panic!("job {job_id} never reached a terminal state");
}

#[tokio::test]
async fn submit_returns_immediately_and_every_job_completes() {
    let (app, _store) = test_app(StubGenerator::ok());

    let (status, body) = post_json(&app, "/api/v1/generate", submit_body()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert!(body["batchId"].is_string());

    let job_ids = body["jobIds"].as_array().unwrap();
    assert_eq!(job_ids.len(), 3);

    for job_id in job_ids {
        let job = poll_until_terminal(&app, job_id.as_str().unwrap()).await;
        assert_eq!(job["status"], "complete");
        assert_eq!(job["imageUrl"], IMAGE_URI);
        assert!(job.get("error").is_none());
    }
}

#[tokio::test]
async fn provider_failure_surfaces_as_per_job_error() {
    let (app, _store) = test_app(StubGenerator::failing("model overloaded"));

    let (status, body) = post_json(&app, "/api/v1/generate", submit_body()).await;
    assert_eq!(status, StatusCode::OK);

    for job_id in body["jobIds"].as_array().unwrap() {
        let job = poll_until_terminal(&app, job_id.as_str().unwrap()).await;
        assert_eq!(job["status"], "error");
        assert!(job["error"].as_str().unwrap().contains("model overloaded"));
        assert!(job.get("imageUrl").is_none());
    }
}

#[tokio::test]
async fn out_of_range_requests_are_rejected_before_any_job_exists() {
    let (app, store) = test_app(StubGenerator::ok());

    let cases = [
        json!({ "prompt": "hi", "imageCount": 3, "concurrency": 2, "temperature": 1.0 }),
        json!({ "prompt": "a fox", "imageCount": 0, "concurrency": 2, "temperature": 1.0 }),
        json!({ "prompt": "a fox", "imageCount": 11, "concurrency": 2, "temperature": 1.0 }),
        json!({ "prompt": "a fox", "imageCount": 3, "concurrency": 6, "temperature": 1.0 }),
        json!({ "prompt": "a fox", "imageCount": 3, "concurrency": 2, "temperature": 2.5 }),
    ];

    for case in cases {
        let (status, body) = post_json(&app, "/api/v1/generate", case.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted: {case}");
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    // Validation failures must not leave partial state behind.
    assert_eq!(store.job_count(), 0);
    assert_eq!(store.batch_count(), 0);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request_not_a_crash() {
    let (app, _store) = test_app(StubGenerator::ok());

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn invalid_reference_image_is_rejected() {
    let (app, _store) = test_app(StubGenerator::ok());

    let mut body = submit_body();
    body["image"] = json!("not-a-data-uri");
    body["mode"] = json!("reference");

    let (status, response) = post_json(&app, "/api/v1/generate", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("data URI"));
}

#[tokio::test]
async fn unknown_identifiers_return_not_found() {
    let (app, _store) = test_app(StubGenerator::ok());
    let missing = uuid::Uuid::new_v4();

    let (status, body) = get_json(&app, &format!("/api/v1/jobs/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let (status, body) = get_json(&app, &format!("/api/v1/batches/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn batch_snapshot_echoes_jobs_and_concurrency() {
    let (app, _store) = test_app(StubGenerator::ok());

    let (_, submitted) = post_json(&app, "/api/v1/generate", submit_body()).await;
    let batch_id = submitted["batchId"].as_str().unwrap();

    let (status, batch) = get_json(&app, &format!("/api/v1/batches/{batch_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(batch["batchId"], submitted["batchId"]);
    assert_eq!(batch["jobIds"], submitted["jobIds"]);
    assert_eq!(batch["concurrency"], 2);
    assert!(batch["createdAt"].is_string());
}

#[tokio::test]
async fn reclaimed_jobs_become_not_found() {
    let (app, store) = test_app(StubGenerator::ok());

    let (_, submitted) = post_json(&app, "/api/v1/generate", submit_body()).await;
    let job_id = submitted["jobIds"][0].as_str().unwrap().to_string();
    poll_until_terminal(&app, &job_id).await;

    store.reclaim(chrono::Duration::zero());

    let (status, _) = get_json(&app, &format!("/api/v1/jobs/{job_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_store_occupancy() {
    let (app, _store) = test_app(StubGenerator::ok());

    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["jobs"], 0);
    assert_eq!(body["batches"], 0);

    post_json(&app, "/api/v1/generate", submit_body()).await;

    let (_, body) = get_json(&app, "/health").await;
    assert_eq!(body["jobs"], 3);
    assert_eq!(body["batches"], 1);
}

#[tokio::test]
async fn index_page_is_served() {
    let (app, _store) = test_app(StubGenerator::ok());

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("<title>imageburst</title>"));
}
