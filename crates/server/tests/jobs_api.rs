//! Integration tests for the job CRUD surface (spec §4.H, §8), driven
//! through the real `axum::Router` with `tower::ServiceExt::oneshot`
//! rather than by calling handlers directly.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ecss_core::{AwsConfig, ClusterConfig, Config, LogConfig, ServerConfig, StoreConfig};
use ecss_scheduler::Mutation;
use ecss_server::state::AppState;
use ecss_store::MemoryStore;
use ecss_trigger::TriggerRegistry;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        server: ServerConfig { host: "127.0.0.1".to_string(), port: 0, cors_origin: "*".to_string() },
        cluster: ClusterConfig { ecs_cluster: Some("test-cluster".to_string()), name: Some("test".to_string()) },
        store: StoreConfig {
            sqlite_file: None,
            s3_bucket: None,
            s3_prefix: None,
            dynamodb_table: None,
            elasticsearch_index: None,
            elasticsearch_hosts: None,
        },
        aws: AwsConfig { region: "us-east-1".to_string(), access_key_id: None, secret_access_key: None, session_token: None, endpoint_url: None },
        log: LogConfig { level: "info".to_string(), folder: None },
    }
}

/// Builds a fresh router over an empty `MemoryStore`. The mutation
/// receiver is leaked into the returned tuple so the sender never sees
/// a closed channel mid-test; no scheduler loop is running to drain it,
/// which is fine at the handful of mutations these tests produce.
fn test_app() -> axum::Router {
    let store: Arc<dyn ecss_store::JobStore> = Arc::new(MemoryStore::new());
    let (tx, rx) = tokio::sync::mpsc::channel::<Mutation>(32);
    std::mem::forget(rx);
    let triggers = Arc::new(TriggerRegistry::new());
    let state = Arc::new(AppState::new(store, tx, triggers, test_config()));
    ecss_server::build_router(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

fn put(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn create_without_id_defaults_to_task_definition() {
    let app = test_app();
    let body = json!({ "taskDefinition": "sleeper-task", "schedule": "* * * * * * * *" });

    let response = app.oneshot(post("/jobs", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    assert_eq!(created["id"], "sleeper-task");
    assert_eq!(created["link"]["href"], "/jobs/sleeper-task");
}

#[tokio::test]
async fn duplicate_id_is_rejected_with_409() {
    let app = test_app();
    let body = json!({ "id": "dup", "taskDefinition": "sleeper-task", "schedule": "* * * * * * * *" });

    let first = app.clone().oneshot(post("/jobs", body.clone())).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(post("/jobs", body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn managed_fields_on_ingress_are_dropped_not_rejected() {
    let app = test_app();
    let body = json!({
        "id": "managed",
        "taskDefinition": "sleeper-task",
        "schedule": "* * * * * * * *",
        "lastRun": "2026-01-01T00:00:00Z",
        "lastRunTasks": ["arn:already:run"],
        "estimatedNextRun": "2026-01-02T00:00:00Z",
    });

    let response = app.clone().oneshot(post("/jobs", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let fetched = app.oneshot(get("/jobs/managed")).await.unwrap();
    let job = body_json(fetched).await;
    assert_eq!(job["lastRun"], Value::Null);
    assert!(job["lastRunTasks"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn wildcard_schedule_is_resolved_once_and_stays_stable_across_reads() {
    let app = test_app();
    let body = json!({ "id": "wild", "taskDefinition": "sleeper-task", "schedule": "? ? * * * * * *" });

    app.clone().oneshot(post("/jobs", body)).await.unwrap();

    let first = body_json(app.clone().oneshot(get("/jobs/wild")).await.unwrap()).await;
    let second = body_json(app.oneshot(get("/jobs/wild")).await.unwrap()).await;

    let schedule = first["schedule"].as_str().unwrap();
    assert!(!schedule.contains('?'), "stored schedule must have wildcards resolved, got {schedule:?}");
    assert_eq!(first["schedule"], second["schedule"]);
}

#[tokio::test]
async fn list_is_paginated_and_ordered_by_id() {
    let app = test_app();
    for id in ["b", "a", "c"] {
        let body = json!({ "id": id, "taskDefinition": "sleeper-task", "schedule": "* * * * * * * *" });
        app.clone().oneshot(post("/jobs", body)).await.unwrap();
    }

    let response = app.clone().oneshot(get("/jobs?skip=0&count=2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(axum::http::header::CONTENT_RANGE));

    let page = body_json(response).await;
    let ids: Vec<&str> = page["items"].as_array().unwrap().iter().map(|j| j["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(page["total"], 3);
    assert!(page["next"]["href"].as_str().unwrap().contains("skip=2"));
}

#[tokio::test]
async fn dry_run_without_trigger_uses_untriggered_clamp() {
    let app = test_app();
    let body = json!({ "id": "dryrun", "taskDefinition": "sleeper-task", "schedule": "* * * * * * * *", "taskCount": 3 });
    app.clone().oneshot(post("/jobs", body)).await.unwrap();

    let response = app.oneshot(get("/jobs/dryrun/dry-run")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let result = body_json(response).await;
    assert_eq!(result["launch_count"], 3);
    assert_eq!(result["trigger_error"], Value::Null);
}

#[tokio::test]
async fn suspend_then_resume_via_put_round_trips() {
    let app = test_app();
    let body = json!({ "id": "pausable", "taskDefinition": "sleeper-task", "schedule": "* * * * * * * *" });
    app.clone().oneshot(post("/jobs", body)).await.unwrap();

    let paused = app.clone().oneshot(put("/jobs/pausable", json!({ "suspended": true }))).await.unwrap();
    assert_eq!(paused.status(), StatusCode::OK);
    assert_eq!(body_json(paused).await["suspended"], true);

    let resumed = app.clone().oneshot(put("/jobs/pausable", json!({ "suspended": false }))).await.unwrap();
    assert_eq!(body_json(resumed).await["suspended"], false);

    let fetched = body_json(app.oneshot(get("/jobs/pausable")).await.unwrap()).await;
    assert_eq!(fetched["suspended"], false);
}

#[tokio::test]
async fn get_missing_job_is_404() {
    let app = test_app();
    let response = app.oneshot(get("/jobs/does-not-exist")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn advisory_lock_sentinel_is_invisible_to_the_jobs_api() {
    let store: Arc<dyn ecss_store::JobStore> = Arc::new(MemoryStore::new());
    let lock = ecss_scheduler::AdvisoryLock::new(store.clone(), "proc-a");
    lock.acquire().await.unwrap();
    let real = json!({
        "id": "real-job",
        "taskDefinition": "sleeper-task",
        "schedule": "* * * * * * * *",
    });
    let real: ecss_core::Job = serde_json::from_value(real).unwrap();
    store.create(real).await.unwrap();

    let (tx, rx) = tokio::sync::mpsc::channel::<Mutation>(32);
    std::mem::forget(rx);
    let triggers = Arc::new(TriggerRegistry::new());
    let state = Arc::new(AppState::new(store, tx, triggers, test_config()));
    let app = ecss_server::build_router(state);

    let listed = body_json(app.clone().oneshot(get("/jobs")).await.unwrap()).await;
    assert_eq!(listed["total"], 1);
    let ids: Vec<&str> = listed["items"].as_array().unwrap().iter().map(|j| j["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["real-job"]);

    let fetched = app.clone().oneshot(get(&format!("/jobs/{}", ecss_store::LOCK_JOB_ID))).await.unwrap();
    assert_eq!(fetched.status(), StatusCode::NOT_FOUND);

    let deleted = app
        .oneshot(Request::builder().method("DELETE").uri(format!("/jobs/{}", ecss_store::LOCK_JOB_ID)).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_job_body_is_422_with_field_errors() {
    let app = test_app();
    let body = json!({ "id": "bad id with spaces", "taskDefinition": "sleeper-task", "schedule": "* * * * * * * *" });

    let response = app.oneshot(post("/jobs", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err = body_json(response).await;
    assert!(err["errors"].as_array().unwrap().iter().any(|e| e["field"] == "id"));
}
