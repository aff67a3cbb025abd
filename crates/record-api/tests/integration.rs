//! Integration tests: create/list/get, edit history, approvals, delete, auth headers.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use record_api::server::{self, AppState};
use record_store::InMemoryRecordStore;
use record_workflow::{ApprovalPolicy, LevelPolicy, WorkflowService};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

fn app_with_policy(approval: ApprovalPolicy) -> axum::Router {
    let workflow = Arc::new(WorkflowService::with_policies(
        InMemoryRecordStore::new(),
        LevelPolicy::standard(),
        approval,
    ));
    server::router(Arc::new(AppState { workflow }))
}

fn test_app() -> axum::Router {
    app_with_policy(ApprovalPolicy::default())
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    actor: Option<(&str, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((id, role)) = actor {
        builder = builder.header("x-user-id", id).header("x-user-role", role);
    }
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let j = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, j)
}

async fn create(app: &axum::Router, body: Value) -> String {
    let (status, j) = send(app, "POST", "/api/records", Some(("author", "")), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(j["code"], 201);
    j["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_ok() {
    let app = test_app();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn create_then_get_is_pending_without_history() {
    let app = test_app();
    let id = create(&app, json!({ "title": "Policy X", "content": "v1" })).await;

    let (status, j) = send(&app, "GET", &format!("/api/records/{}", id), Some(("u1", "")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["data"]["title"], "Policy X");
    assert_eq!(j["data"]["content"], "v1");
    assert_eq!(j["data"]["approval_status"], "대기");
    assert_eq!(j["data"]["created_by"], "author");
    assert_eq!(j["data"]["history"].as_array().unwrap().len(), 0);
    assert_eq!(j["data"]["approvers"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_without_content_is_400() {
    let app = test_app();
    let (status, j) = send(
        &app,
        "POST",
        "/api/records",
        Some(("author", "")),
        Some(json!({ "title": "Policy X" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(j["code"], 400);

    let (_, j) = send(&app, "GET", "/api/records", Some(("u1", "")), None).await;
    assert_eq!(j["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn malformed_body_is_400_envelope() {
    let app = test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/api/records")
        .header("x-user-id", "author")
        .header("content-type", "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let j: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(j["code"], 400);
    assert!(j["data"].is_null());

    let (status, j) = send(
        &app,
        "POST",
        "/api/records",
        Some(("author", "")),
        Some(json!({ "title": "Policy X", "content": "v1", "tags": "daily" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(j["code"], 400);
    assert!(!j["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn missing_user_header_is_401() {
    let app = test_app();
    let (status, j) = send(
        &app,
        "POST",
        "/api/records",
        None,
        Some(json!({ "title": "Policy X", "content": "v1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(j["code"], 401);
}

#[tokio::test]
async fn edit_records_history() {
    let app = test_app();
    let id = create(&app, json!({ "title": "Policy X", "content": "v1", "tags": ["daily"] })).await;

    let (status, j) = send(
        &app,
        "PUT",
        &format!("/api/records/{}", id),
        Some(("editor", "")),
        Some(json!({ "content": "v2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["data"]["content"], "v2");
    assert_eq!(j["data"]["title"], "Policy X");
    assert_eq!(j["data"]["tags"], json!(["daily"]));
    let history = j["data"]["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["content"], "v1");
    assert_eq!(history[0]["edited_by"], "editor");

    let (status, j) = send(
        &app,
        "PUT",
        &format!("/api/records/{}", id),
        Some(("editor", "")),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["data"]["content"], "v2");
    assert_eq!(j["data"]["history"].as_array().unwrap().len(), 2);

    let (_, j) = send(
        &app,
        "PUT",
        &format!("/api/records/{}", id),
        Some(("editor", "")),
        Some(json!({ "tags": [] })),
    )
    .await;
    assert_eq!(j["data"]["tags"], json!([]));
    assert_eq!(j["data"]["history"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn edit_missing_is_404() {
    let app = test_app();
    let (status, j) = send(
        &app,
        "PUT",
        "/api/records/nonexistent-id",
        Some(("editor", "")),
        Some(json!({ "content": "v2" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(j["code"], 404);
}

#[tokio::test]
async fn approval_chain() {
    let app = test_app();
    let id = create(&app, json!({ "title": "Policy X", "content": "v1" })).await;
    let uri = format!("/api/records/{}/approve", id);

    let (status, j) = send(&app, "POST", &uri, Some(("u1", "default")), Some(json!({ "status": "승인" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["data"]["approvers"][0]["level"], 1);
    assert_eq!(j["data"]["approvers"][0]["status"], "승인");
    assert_eq!(j["data"]["approval_status"], "대기");

    let (_, j) = send(&app, "POST", &uri, Some(("m1", "manager")), Some(json!({ "status": "승인" }))).await;
    assert_eq!(j["data"]["approval_status"], "대기");

    let (_, j) = send(&app, "POST", &uri, Some(("a1", "admin")), Some(json!({ "status": "승인" }))).await;
    assert_eq!(j["data"]["approval_status"], "승인");
    assert_eq!(j["data"]["approvers"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn admin_rejection_rejects() {
    let app = test_app();
    let id = create(&app, json!({ "title": "Policy X", "content": "v1" })).await;
    let uri = format!("/api/records/{}/approve", id);

    send(&app, "POST", &uri, Some(("u1", "")), Some(json!({ "status": "승인" }))).await;
    let (status, j) = send(&app, "POST", &uri, Some(("a1", "admin")), Some(json!({ "status": "반려" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["data"]["approval_status"], "반려");
}

#[tokio::test]
async fn vacuous_policy_approves_on_single_level() {
    let app = app_with_policy(ApprovalPolicy::vacuous());
    let id = create(&app, json!({ "title": "Policy X", "content": "v1" })).await;
    let (_, j) = send(
        &app,
        "POST",
        &format!("/api/records/{}/approve", id),
        Some(("u1", "")),
        Some(json!({ "status": "승인" })),
    )
    .await;
    assert_eq!(j["data"]["approval_status"], "승인");
}

#[tokio::test]
async fn repeated_approval_keeps_one_entry_per_level() {
    let app = test_app();
    let id = create(&app, json!({ "title": "Policy X", "content": "v1" })).await;
    let uri = format!("/api/records/{}/approve", id);
    send(&app, "POST", &uri, Some(("m1", "manager")), Some(json!({ "status": "반려" }))).await;
    let (_, j) = send(&app, "POST", &uri, Some(("m2", "manager")), Some(json!({ "status": "approved" }))).await;
    let approvers = j["data"]["approvers"].as_array().unwrap();
    assert_eq!(approvers.len(), 1);
    assert_eq!(approvers[0]["level"], 2);
    assert_eq!(approvers[0]["user"], "m2");
    assert_eq!(approvers[0]["status"], "승인");
}

#[tokio::test]
async fn invalid_decision_is_400_and_missing_record_404() {
    let app = test_app();
    let id = create(&app, json!({ "title": "Policy X", "content": "v1" })).await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/records/{}/approve", id),
        Some(("u1", "")),
        Some(json!({ "status": "대기" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/records/nonexistent-id/approve",
        Some(("u1", "")),
        Some(json!({ "status": "승인" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_then_get_404() {
    let app = test_app();
    let id = create(&app, json!({ "title": "Policy X", "content": "v1" })).await;
    let (status, j) = send(&app, "DELETE", &format!("/api/records/{}", id), Some(("u1", "")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["data"]["deleted"], true);

    let (status, _) = send(&app, "GET", &format!("/api/records/{}", id), Some(("u1", "")), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", &format!("/api/records/{}", id), Some(("u1", "")), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_by_regulation_tags_and_search() {
    let app = test_app();
    create(
        &app,
        json!({ "title": "Fire Safety Plan", "content": "c", "regulation": "osha", "tags": ["daily", "weekly"] }),
    )
    .await;
    create(
        &app,
        json!({ "title": "safety audit", "content": "c", "regulation": "osha", "tags": ["monthly"] }),
    )
    .await;
    create(&app, json!({ "title": "Budget", "content": "c", "tags": ["daily"] })).await;

    let (status, j) = send(&app, "GET", "/api/records", Some(("u1", "")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(j["data"].as_array().unwrap().len(), 3);

    let (_, j) = send(&app, "GET", "/api/records?regulation=osha", Some(("u1", "")), None).await;
    assert_eq!(j["data"].as_array().unwrap().len(), 2);

    let (_, j) = send(&app, "GET", "/api/records?tags=daily,weekly", Some(("u1", "")), None).await;
    let hits = j["data"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "Fire Safety Plan");

    let (_, j) = send(&app, "GET", "/api/records?search=SAFETY", Some(("u1", "")), None).await;
    assert_eq!(j["data"].as_array().unwrap().len(), 2);

    let (_, j) = send(
        &app,
        "GET",
        "/api/records?regulation=osha&tags=monthly&search=audit",
        Some(("u1", "")),
        None,
    )
    .await;
    let hits = j["data"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "safety audit");
}
