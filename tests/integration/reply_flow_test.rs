// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::integration::helpers::{services, RecordingAutomation, StaticTier};
use axum::http::StatusCode;
use axum_test::TestServer;
use placewatch::presentation::routes;
use placewatch::workers::{ReplyWorker, WorkerManager};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

async fn wait_for_terminal(server: &TestServer, id: &str) -> Value {
    for _ in 0..200 {
        let document: Value = server.get(&format!("/v1/replies/{}", id)).await.json();
        if document["status"] == "completed" || document["status"] == "failed" {
            return document;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never reached a terminal state", id);
}

#[tokio::test]
async fn test_replies_are_written_back_in_submission_order() {
    // Given: 带有回复工作器的应用
    let app_services = services(
        StaticTier {
            places: vec![],
            reviews: vec![],
        },
        &[],
    );
    let queue = app_services.queue.clone();
    let automation = Arc::new(RecordingAutomation::default());

    let mut workers = WorkerManager::new();
    workers.spawn(Arc::new(
        ReplyWorker::new(queue.clone(), automation.clone(), workers.shutdown_signal())
            .with_inter_job_pause(Duration::from_millis(5)),
    ));
    let server = TestServer::new(routes::app(app_services)).unwrap();

    // When: 连续提交三个任务，其中一个的评论已不存在
    let mut ids = Vec::new();
    for review_id in ["r-1", "gone", "r-3"] {
        let response = server
            .post("/v1/replies")
            .json(&json!({
                "placeId": "1234",
                "reviewId": review_id,
                "replyText": "감사합니다",
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::ACCEPTED);
        ids.push(response.json::<Value>()["id"].as_str().unwrap().to_string());
    }

    // Then: 成功的任务完成，失败的任务带有错误，且不影响后续任务
    let first = wait_for_terminal(&server, &ids[0]).await;
    let gone = wait_for_terminal(&server, &ids[1]).await;
    let third = wait_for_terminal(&server, &ids[2]).await;

    assert_eq!(first["status"], "completed");
    assert!(first["completedAt"].is_string());
    assert_eq!(gone["status"], "failed");
    assert!(gone["error"].as_str().unwrap().contains("not found"));
    assert_eq!(third["status"], "completed");

    assert_eq!(*automation.posted.lock().unwrap(), vec!["r-1", "r-3"]);
    assert_eq!(queue.depth(), 0);

    workers.shutdown().await;
}
