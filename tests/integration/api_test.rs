// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::integration::helpers::{review, services, StaticTier};
use axum::http::StatusCode;
use axum_test::TestServer;
use placewatch::presentation::routes;
use placewatch::queue::{ReplyQueue, ReplyQueueConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

fn places_tier() -> StaticTier {
    StaticTier {
        places: vec![("101", "서촌 커피"), ("202", "북촌 커피"), ("303", "삼청 커피")],
        reviews: vec![
            (
                None,
                vec![review("a1", "2026.1.20."), review("a2", "2026.1.18.")],
                Some("n1"),
            ),
            (Some("n1"), vec![review("a3", "2026.1.02.")], None),
        ],
    }
}

fn create_test_app() -> TestServer {
    let app = routes::app(services(
        places_tier(),
        &["http://10.0.0.1:3128", "http://10.0.0.2:3128"],
    ));
    TestServer::new(app).unwrap()
}

fn reply_body(review_id: &str) -> Value {
    json!({
        "placeId": "1234",
        "reviewId": review_id,
        "replyText": "방문해 주셔서 감사합니다",
        "reviewDate": "2026-01-20",
    })
}

#[tokio::test]
async fn test_health_reports_tiers_proxies_and_queue() {
    let server = create_test_app();

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tiers"], json!(["static"]));
    assert_eq!(body["proxies"]["total"], 2);
    assert_eq!(body["proxies"]["active"], 2);
    assert_eq!(body["queue"]["depth"], 0);
    assert!(body["queue"]["current"].is_null());
}

#[tokio::test]
async fn test_search_marks_target() {
    let server = create_test_app();

    // When: POST /v1/search
    let response = server
        .post("/v1/search")
        .json(&json!({ "keyword": "커피", "targetId": "202", "limit": 2 }))
        .await;

    // Then: 结果被截断并标记目标
    assert_eq!(response.status_code(), StatusCode::OK);
    let results: Vec<Value> = response.json();
    assert_eq!(results.len(), 2);
    assert_eq!(results[1]["id"], "202");
    assert_eq!(results[1]["isTarget"], true);
    assert_eq!(results[1]["rank"], 2);
    assert_eq!(results[0]["isTarget"], false);
}

#[tokio::test]
async fn test_search_rejects_empty_keyword() {
    let server = create_test_app();

    let response = server.post("/v1/search").json(&json!({ "keyword": "" })).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("Keyword cannot be empty"));
}

#[tokio::test]
async fn test_rank_check_reports_each_keyword() {
    let server = create_test_app();

    let response = server
        .post("/v1/ranks")
        .json(&json!({ "targetId": "303", "keywords": ["커피", "  ", "카페"] }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let reports: Vec<Value> = response.json();
    assert_eq!(reports.len(), 2);
    for report in &reports {
        assert_eq!(report["rank"], 3);
        assert!(report["error"].is_null());
    }
}

#[tokio::test]
async fn test_collect_latest_reviews() {
    let server = create_test_app();

    let response = server
        .post("/v1/reviews/collect")
        .json(&json!({ "placeId": "101", "count": 5 }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 3);
    assert_eq!(body["pagesFetched"], 2);
    assert_eq!(body["stopReason"], "end_of_feed");
}

#[tokio::test]
async fn test_collect_rejects_inverted_window() {
    let server = create_test_app();

    let response = server
        .post("/v1/reviews/collect")
        .json(&json!({ "placeId": "101", "startDate": "2026-02-01", "endDate": "2026-01-01" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reply_submit_then_poll() {
    let server = create_test_app();

    // When: 提交两个回复任务
    let first = server.post("/v1/replies").json(&reply_body("r-1")).await;
    let second = server.post("/v1/replies").json(&reply_body("r-2")).await;

    // Then: 返回 202 和任务标识
    assert_eq!(first.status_code(), StatusCode::ACCEPTED);
    assert_eq!(second.status_code(), StatusCode::ACCEPTED);
    let second_id = second.json::<Value>()["id"].as_str().unwrap().to_string();

    let status = server.get(&format!("/v1/replies/{}", second_id)).await;
    assert_eq!(status.status_code(), StatusCode::OK);
    let document: Value = status.json();
    assert_eq!(document["status"], "queued");
    assert_eq!(document["positionInQueue"], 1);
    assert!(document["estimatedTime"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_reply_with_blank_text_is_rejected() {
    let server = create_test_app();

    let mut body = reply_body("r-1");
    body["replyText"] = json!("   ");
    let response = server.post("/v1/replies").json(&body).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_reply_job_is_not_found() {
    let server = create_test_app();

    let response = server
        .get(&format!("/v1/replies/{}", Uuid::new_v4()))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_queue_returns_service_unavailable() {
    let mut app_services = services(places_tier(), &[]);
    app_services.queue = Arc::new(ReplyQueue::new(ReplyQueueConfig {
        capacity: 1,
        ..ReplyQueueConfig::default()
    }));
    let server = TestServer::new(routes::app(app_services)).unwrap();

    let accepted = server.post("/v1/replies").json(&reply_body("r-1")).await;
    let rejected = server.post("/v1/replies").json(&reply_body("r-2")).await;

    assert_eq!(accepted.status_code(), StatusCode::ACCEPTED);
    assert_eq!(rejected.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_proxy_listing_check_and_reset() {
    let server = create_test_app();

    let listed = server.get("/v1/proxies").await;
    assert_eq!(listed.status_code(), StatusCode::OK);
    let proxies: Vec<Value> = listed.json();
    assert_eq!(proxies.len(), 2);
    assert_eq!(proxies[0]["active"], true);

    let checked = server.post("/v1/proxies/check").await;
    assert_eq!(checked.status_code(), StatusCode::OK);
    let reports: Vec<Value> = checked.json();
    assert_eq!(reports.len(), 2);

    let reset = server.post("/v1/proxies/reset").await;
    assert_eq!(reset.status_code(), StatusCode::OK);
    let after: Vec<Value> = reset.json();
    assert!(after.iter().all(|p| p["active"] == true && p["failureCount"] == 0));
}
