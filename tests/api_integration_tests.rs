//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycles against an in-memory upstream.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use feedsync::{
    api::create_router, cache::CacheStore, feed::Account, upstream::InMemoryThreadApi, AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    let api = InMemoryThreadApi::new(Account {
        id: "a1".into(),
        handle: "ann".into(),
        name: "Ann".into(),
    });
    let state = AppState::new(CacheStore::new(100, 300), Arc::new(api));
    create_router(state)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn thread_ids(page: &Value) -> Vec<String> {
    page["threads"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect()
}

async fn create(app: &Router, body: Value) -> String {
    let (status, json) = send(app, "POST", "/threads", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

// == List Endpoint Tests ==

#[tokio::test]
async fn test_list_empty_feed() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/threads", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current_page"], 1);
    assert_eq!(json["results"], 0);
    assert!(thread_ids(&json).is_empty());
}

#[tokio::test]
async fn test_list_rejects_page_zero() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/threads?page=0", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Page"));
}

#[tokio::test]
async fn test_list_rejects_page_past_cap() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/threads?page=100000000", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("maximum"));
}

#[tokio::test]
async fn test_explicit_first_page_shares_cache_entry() {
    let app = create_test_app();
    send(&app, "GET", "/threads", None).await;
    send(&app, "GET", "/threads?page=1", None).await;

    let (_, json) = send(&app, "GET", "/stats", None).await;

    assert_eq!(json["misses"], 1);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["total_entries"], 1);
}

#[tokio::test]
async fn test_channel_list_only_holds_channel_threads() {
    let app = create_test_app();
    let in_channel = create(&app, json!({"title": "Inside", "channel_id": "c1"})).await;
    create(&app, json!({"title": "Outside"})).await;

    let (status, json) = send(&app, "GET", "/channels/c1/threads", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(thread_ids(&json), vec![in_channel]);
}

// == Create Endpoint Tests ==

#[tokio::test]
async fn test_create_shows_optimistic_entry_then_server_entry() {
    let app = create_test_app();
    let (_, empty) = send(&app, "GET", "/threads", None).await;
    assert!(thread_ids(&empty).is_empty());

    let created = create(
        &app,
        json!({
            "title": "Hello",
            "author": {"id": "a1", "handle": "ann"}
        }),
    )
    .await;

    // Stale page is served while it is re-fetched
    let (_, stale) = send(&app, "GET", "/threads", None).await;
    let ids = thread_ids(&stale);
    assert_eq!(ids.len(), 1);
    assert!(ids[0].starts_with("optimistic_thread_id_"));
    assert_eq!(stale["threads"][0]["visibility"], "draft");

    tokio::time::sleep(Duration::from_millis(50)).await;

    let (_, fresh) = send(&app, "GET", "/threads", None).await;
    assert_eq!(thread_ids(&fresh), vec![created]);
}

#[tokio::test]
async fn test_create_empty_title_rejected() {
    let app = create_test_app();

    let (status, json) = send(&app, "POST", "/threads", Some(json!({"title": "  "}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_create_missing_title_rejected() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/threads")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"body":"no title"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// == Update Endpoint Tests ==

#[tokio::test]
async fn test_update_thread() {
    let app = create_test_app();
    let id = create(&app, json!({"title": "Before"})).await;

    let (status, json) = send(
        &app,
        "PATCH",
        &format!("/threads/{}", id),
        Some(json!({"title": "After", "body": "<p>new &amp; improved</p>"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "After");
    assert_eq!(json["description"], "new & improved");
}

#[tokio::test]
async fn test_update_unknown_thread() {
    let app = create_test_app();

    let (status, _) = send(
        &app,
        "PATCH",
        "/threads/missing",
        Some(json!({"title": "After"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == Delete Endpoint Tests ==

#[tokio::test]
async fn test_delete_thread_refetches_lists() {
    let app = create_test_app();
    let first = create(&app, json!({"title": "First"})).await;
    let second = create(&app, json!({"title": "Second"})).await;

    let (_, before) = send(&app, "GET", "/threads", None).await;
    assert_eq!(thread_ids(&before), vec![second.clone(), first.clone()]);

    let (status, json) = send(&app, "DELETE", &format!("/threads/{}", second), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], second.as_str());

    // The list was re-fetched before the response, so no wait is needed
    let (_, after) = send(&app, "GET", "/threads", None).await;
    assert_eq!(thread_ids(&after), vec![first]);
}

#[tokio::test]
async fn test_delete_unknown_thread() {
    let app = create_test_app();

    let (status, json) = send(&app, "DELETE", "/threads/missing", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("missing"));
}

// == Like Endpoint Tests ==

#[tokio::test]
async fn test_like_and_unlike() {
    let app = create_test_app();
    let id = create(&app, json!({"title": "Likeable"})).await;
    send(&app, "GET", "/threads", None).await;

    let (status, json) = send(&app, "PUT", &format!("/threads/{}/like", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["liked"], true);

    let (_, page) = send(&app, "GET", "/threads", None).await;
    assert_eq!(page["threads"][0]["likes"]["likes"], 1);
    assert_eq!(page["threads"][0]["likes"]["liked"], true);

    tokio::time::sleep(Duration::from_millis(50)).await;

    let (status, json) = send(&app, "DELETE", &format!("/threads/{}/like", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["liked"], false);

    let (_, page) = send(&app, "GET", "/threads", None).await;
    assert_eq!(page["threads"][0]["likes"]["likes"], 0);
}

// == Accept Endpoint Tests ==

#[tokio::test]
async fn test_accept_publishes_thread_in_review() {
    let app = create_test_app();
    let id = create(&app, json!({"title": "Queued", "visibility": "review"})).await;

    let (status, json) = send(&app, "POST", &format!("/threads/{}/accept", id), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["visibility"], "published");
}

// == Stats Endpoint Tests ==

#[tokio::test]
async fn test_stats_track_reads_and_writes() {
    let app = create_test_app();
    send(&app, "GET", "/threads", None).await;
    send(&app, "GET", "/threads", None).await;
    create(
        &app,
        json!({"title": "Counted", "author": {"id": "a1", "handle": "ann"}}),
    )
    .await;

    let (status, json) = send(&app, "GET", "/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["optimistic_writes"], 1);
    assert_eq!(json["invalidations"], 1);
    assert_eq!(json["total_entries"], 1);
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}
