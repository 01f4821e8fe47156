#![cfg(feature = "server")]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use club_ledger::{router, AppState, Ledger};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Pseudo-unique national_id for tests
fn unique_national_id() -> String {
    format!("UG{:08}", NEXT_ID.fetch_add(1, Ordering::SeqCst))
}

fn test_app() -> Router {
    let ledger = Ledger::in_memory().unwrap();
    router(AppState::new(Arc::new(ledger)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn create_member(app: &Router, name: &str, national_id: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/members",
        Some(json!({ "name": name, "national_id": national_id, "date_joined": "2023-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_member_then_get() {
    let app = test_app();
    let national_id = unique_national_id();

    let created = create_member(&app, "Alice", &national_id).await;
    assert_eq!(created["name"], "Alice");
    assert_eq!(created["national_id"], national_id.as_str());
    assert_eq!(created["date_joined"], "2023-01-01");

    let uri = format!("/members/{}", created["id"]);
    let (status, fetched) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_create_member_trailing_slash() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/members/",
        Some(json!({ "name": "Bob", "national_id": unique_national_id(), "date_joined": "2023-02-01" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Bob");
}

#[tokio::test]
async fn test_duplicate_national_id() {
    let app = test_app();
    let national_id = unique_national_id();
    create_member(&app, "Charlie", &national_id).await;

    let (status, body) = send(
        &app,
        "POST",
        "/members",
        Some(json!({ "name": "Duplicate Charlie", "national_id": national_id, "date_joined": "2023-03-02" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_get_missing_member() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/members/12345", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Member not found");
}

#[tokio::test]
async fn test_list_members_paging() {
    let app = test_app();
    for name in ["A", "B", "C"] {
        create_member(&app, name, &unique_national_id()).await;
    }

    let (status, body) = send(&app, "GET", "/members", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (_, body) = send(&app, "GET", "/members?skip=1&limit=1", None).await;
    let page = body.as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["name"], "B");

    let (_, body) = send(&app, "GET", "/members?skip=50", None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = send(&app, "GET", "/members?limit=0", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_partial_update() {
    let app = test_app();
    let national_id = unique_national_id();
    let created = create_member(&app, "Dana", &national_id).await;
    let uri = format!("/members/{}", created["id"]);

    let (status, updated) = send(&app, "PATCH", &uri, Some(json!({ "name": "Dana R." }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Dana R.");
    assert_eq!(updated["national_id"], national_id.as_str());
    assert_eq!(updated["date_joined"], "2023-01-01");

    let (status, updated) =
        send(&app, "PUT", &uri, Some(json!({ "date_joined": "2024-06-01" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Dana R.");
    assert_eq!(updated["date_joined"], "2024-06-01");

    let (status, _) = send(&app, "PATCH", "/members/999", Some(json!({ "name": "X" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_contribution() {
    let app = test_app();
    let member = create_member(&app, "Bob", &unique_national_id()).await;
    let member_id = member["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/contributions/",
        Some(json!({ "member_id": member_id, "amount": 100.0, "month": "2023-10" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], 100.0);
    assert_eq!(body["member_id"], member_id);
    assert!(body["id"].is_i64());
}

#[tokio::test]
async fn test_contribution_for_missing_member() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/contributions/",
        Some(json!({ "member_id": 4242, "amount": 10.0, "month": "2023-10" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Member not found");
}

#[tokio::test]
async fn test_invalid_contribution() {
    let app = test_app();
    let member = create_member(&app, "Eve", &unique_national_id()).await;

    let (status, _) = send(
        &app,
        "POST",
        "/contributions",
        Some(json!({ "member_id": member["id"], "amount": -3.0, "month": "2023-10" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_worked_example() {
    let app = test_app();
    let alice = create_member(&app, "Alice", "UG123").await;
    let contribution = json!({ "member_id": alice["id"], "amount": 100.0, "month": "2023-10" });

    let (status, _) = send(&app, "POST", "/contributions/", Some(contribution.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", "/contributions/", Some(contribution)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("2023-10"));

    let uri = format!("/members/{}/contributions", alice["id"]);
    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{ "id": 1, "member_name": "Alice", "member_id": "UG123", "amount": 100.0, "month": "2023-10" }])
    );
}

#[tokio::test]
async fn test_member_without_contributions_is_not_found() {
    let app = test_app();
    let member = create_member(&app, "Frank", &unique_national_id()).await;

    let uri = format!("/members/{}/contributions", member["id"]);
    let (status, body) = send(&app, "GET", &uri, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No contributions found for this member");
}

#[tokio::test]
async fn test_delete_member_cascades() {
    let app = test_app();
    let member = create_member(&app, "Gina", &unique_national_id()).await;
    let member_id = member["id"].as_i64().unwrap();

    let (_, contribution) = send(
        &app,
        "POST",
        "/contributions/",
        Some(json!({ "member_id": member_id, "amount": 25.0, "month": "2023-09" })),
    )
    .await;

    let (status, body) = send(&app, "DELETE", &format!("/members/{}", member_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let (status, _) = send(&app, "GET", &format!("/members/{}/contributions", member_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", &format!("/contributions/{}", contribution["id"]), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/members/{}", member_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_member_wins_over_invalid_contribution() {
    let app = test_app();

    for body in [
        json!({ "member_id": 4242, "amount": -1.0, "month": "2023-10" }),
        json!({ "member_id": 4242, "amount": 100.0, "month": "October" }),
    ] {
        let (status, body) = send(&app, "POST", "/contributions/", Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Member not found");
    }
}

#[tokio::test]
async fn test_extractor_rejections_use_detail_body() {
    let app = test_app();

    let (status, body) = send(&app, "POST", "/members", Some(json!({ "name": "A" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("national_id"));

    let (status, body) = send(&app, "GET", "/members?skip=abc", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());

    let (status, body) = send(&app, "GET", "/members/abc", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());

    let (status, body) = send(&app, "PATCH", "/members/1", Some(json!({ "date_joined": "soon" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}
