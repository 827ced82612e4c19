use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use throttl_server::{router, ThrottlService, DEFAULT_LIST_LIMIT};
use throttl_store::{DocumentStore, InMemoryStore};

fn app_with_store(store: Arc<dyn DocumentStore>) -> Router {
    router(Arc::new(ThrottlService::new(store, DEFAULT_LIST_LIMIT)))
}

fn app() -> Router {
    app_with_store(Arc::new(InMemoryStore::new()))
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, response_json(response).await)
}

async fn post_raw(app: &Router, uri: &str, body: String) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, response_json(response).await)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(app, uri, body.to_string()).await
}

async fn register_openai(app: &Router) -> String {
    let (status, body) = post(
        app,
        "/apis",
        json!({
            "name": "OpenAI",
            "provider": "openai",
            "window_seconds": 60,
            "max_requests": 100
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["api"]["id"].as_str().unwrap().to_string()
}

async fn record(app: &Router, api_id: &str, units: u64, age_seconds: i64) {
    let timestamp = (Utc::now() - Duration::seconds(age_seconds)).to_rfc3339();
    let (status, body) = post(
        app,
        "/usage",
        json!({ "api_id": api_id, "units": units, "timestamp": timestamp }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn register_applies_default_thresholds() {
    let app = app();
    let (status, body) = post(
        &app,
        "/apis",
        json!({ "name": "OpenAI", "window_seconds": 60, "max_requests": 100 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api"]["name"], "OpenAI");
    assert_eq!(body["api"]["thresholds"], json!([80, 90, 95]));
    assert!(body["api"]["id"].is_string());
    assert!(body["api"]["created_at"].is_string());
}

#[tokio::test]
async fn register_rejects_invalid_window() {
    let app = app();
    let (status, body) = post(
        &app,
        "/apis",
        json!({ "name": "OpenAI", "window_seconds": 0, "max_requests": -1 }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"window_seconds"));
    assert!(fields.contains(&"max_requests"));
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let app = app();
    let (status, body) = post_raw(&app, "/apis", "{not json".to_string()).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "body");
}

#[tokio::test]
async fn list_and_get_registered_apis() {
    let app = app();
    let first = register_openai(&app).await;
    let second = register_openai(&app).await;

    let (status, body) = get(&app, "/apis").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|api| api["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![first.as_str(), second.as_str()]);

    let (status, body) = get(&app, &format!("/apis/{first}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], first);

    let (status, body) = get(&app, "/apis/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "API not found");
}

#[tokio::test]
async fn usage_defaults_to_one_unit() {
    let app = app();
    let api_id = register_openai(&app).await;

    let (status, body) = post(&app, "/usage", json!({ "api_id": api_id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["units"], 1);
    assert!(body["event"]["timestamp"].is_string());
}

#[tokio::test]
async fn usage_rejects_non_positive_units() {
    let app = app();
    let (status, body) = post(&app, "/usage", json!({ "api_id": "x", "units": 0 })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "units");
}

#[tokio::test]
async fn usage_for_unknown_api_is_stored() {
    let app = app();
    let (status, body) = post(&app, "/usage", json!({ "api_id": "never-registered" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["api_id"], "never-registered");
}

#[tokio::test]
async fn status_without_usage() {
    let app = app();
    let api_id = register_openai(&app).await;

    let (status, body) = get(&app, &format!("/status/{api_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_id"], api_id);
    assert_eq!(body["window_seconds"], 60);
    assert_eq!(body["max_requests"], 100);
    assert_eq!(body["current_count"], 0);
    assert_eq!(body["utilization_percent"], 0.0);
    assert_eq!(body["thresholds_crossed"], json!([]));
    assert!(body["projected_hit_in_seconds"].is_null());
}

#[tokio::test]
async fn status_near_limit() {
    let app = app();
    let api_id = register_openai(&app).await;
    record(&app, &api_id, 60, 10).await;
    record(&app, &api_id, 30, 30).await;

    let (status, body) = get(&app, &format!("/status/{api_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_count"], 90);
    assert_eq!(body["utilization_percent"], 90.0);
    assert_eq!(body["thresholds_crossed"], json!([80, 90]));
    assert_eq!(body["projected_hit_in_seconds"], 6);
}

#[tokio::test]
async fn status_over_limit() {
    let app = app();
    let api_id = register_openai(&app).await;
    record(&app, &api_id, 150, 5).await;

    let (_, body) = get(&app, &format!("/status/{api_id}")).await;
    assert_eq!(body["current_count"], 150);
    assert_eq!(body["utilization_percent"], 150.0);
    assert_eq!(body["thresholds_crossed"], json!([80, 90, 95]));
    assert_eq!(body["projected_hit_in_seconds"], 0);
}

#[tokio::test]
async fn status_ignores_expired_usage() {
    let app = app();
    let api_id = register_openai(&app).await;
    record(&app, &api_id, 500, 120).await;

    let (_, body) = get(&app, &format!("/status/{api_id}")).await;
    assert_eq!(body["current_count"], 0);
    assert!(body["projected_hit_in_seconds"].is_null());
}

#[tokio::test]
async fn status_of_unknown_api_is_not_found() {
    let (status, body) = get(&app(), "/status/does-not-exist").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "API not found");
}

#[tokio::test]
async fn repeated_status_queries_agree() {
    let app = app();
    let api_id = register_openai(&app).await;
    record(&app, &api_id, 42, 5).await;

    let (_, first) = get(&app, &format!("/status/{api_id}")).await;
    let (_, second) = get(&app, &format!("/status/{api_id}")).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn health_reports_store_state() {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
    let app = app_with_store(store.clone());

    for uri in ["/test", "/health"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));
    }

    store.close().await.unwrap();

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn closed_store_is_unavailable() {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
    let app = app_with_store(store.clone());
    store.close().await.unwrap();

    let (status, body) = get(&app, "/apis").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "STORE_UNAVAILABLE");
}

#[tokio::test]
async fn version_is_reported() {
    let (status, body) = get(&app(), "/version").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "throttl");
    assert!(body["version"].is_string());
}
