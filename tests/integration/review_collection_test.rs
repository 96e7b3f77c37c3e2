// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::integration::helpers::{client_for, spawn_upstream};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use placewatch::domain::models::review::{CollectionRequest, CollectionWindow, WindowScaling};
use placewatch::domain::services::review_collector::{ReviewCollector, StopReason};
use placewatch::engines::structured_api::StructuredApiTier;
use placewatch::engines::AcquisitionTier;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

type Captured = Arc<Mutex<Vec<Value>>>;

fn review(id: &str, created: &str) -> Value {
    json!({
        "id": id,
        "body": format!("body of {}", id),
        "rating": 4,
        "created": created,
        "author": { "nickname": "visitor" },
        "reply": null,
    })
}

async fn reviews_handler(State(captured): State<Captured>, Json(body): Json<Value>) -> Response {
    let input = body[0]["variables"]["input"].clone();
    captured.lock().unwrap().push(input.clone());

    let (items, cursor) = match input["after"].as_str() {
        None => (
            vec![
                review("r1", "2일 전"),
                review("r2", "1.25.일"),
                review("r3", "2026.1.20."),
            ],
            "c2",
        ),
        // The second page repeats the last item of the first
        Some("c2") => (
            vec![
                review("r3", "2026.1.20."),
                review("r4", "1.15.목"),
                review("r5", "2026.1.05."),
            ],
            "c3",
        ),
        _ => return StatusCode::BAD_GATEWAY.into_response(),
    };

    Json(json!([{ "data": { "visitorReviews": { "cursor": cursor, "items": items } } }]))
        .into_response()
}

async fn collector() -> (ReviewCollector<placewatch::engines::AcquisitionClient>, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/graphql", post(reviews_handler))
        .with_state(captured.clone());
    let base = spawn_upstream(app).await;

    let tiers: Vec<Arc<dyn AcquisitionTier>> = vec![Arc::new(StructuredApiTier::new(
        format!("{}/graphql", base),
        base.clone(),
    ))];
    let client = Arc::new(client_for(tiers));
    (ReviewCollector::new(client, WindowScaling::default()), captured)
}

fn reference() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_window_collection_follows_cursor_and_stops_past_window() {
    let (collector, captured) = collector().await;
    let window = CollectionWindow::with_budget(date(2026, 1, 10), date(2026, 1, 31), 100, 10);

    let collection = collector
        .collect_at("5551234", &CollectionRequest::Window(window), reference())
        .await
        .unwrap();

    let ids: Vec<&str> = collection.items.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r2", "r3", "r4"]);
    assert_eq!(collection.stop_reason, StopReason::PastWindow);
    assert_eq!(collection.pages_fetched, 2);
    assert!(!collection.first_page_fallback);

    assert_eq!(collection.items[0].date, Some(date(2026, 1, 30)));
    assert_eq!(collection.items[1].date, Some(date(2026, 1, 25)));
    assert_eq!(collection.items[3].date, Some(date(2026, 1, 15)));

    let inputs = captured.lock().unwrap();
    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[0]["businessId"], "5551234");
    assert!(inputs[0]["after"].is_null());
    assert_eq!(inputs[1]["after"], "c2");
}

#[tokio::test]
async fn test_later_page_failure_keeps_collected_items() {
    let (collector, _) = collector().await;
    let collector = collector.with_page_size(2);

    let request = CollectionRequest::Count {
        target_count: 10,
        max_pages: 6,
    };
    let collection = collector
        .collect_at("5551234", &request, reference())
        .await
        .unwrap();

    assert_eq!(collection.items.len(), 5);
    assert_eq!(collection.pages_fetched, 2);
    assert!(matches!(collection.stop_reason, StopReason::Interrupted(_)));
}

#[tokio::test]
async fn test_count_collection_stops_at_target() {
    let (collector, captured) = collector().await;

    let collection = collector
        .collect_at(
            "5551234",
            &CollectionRequest::Count {
                target_count: 2,
                max_pages: 5,
            },
            reference(),
        )
        .await
        .unwrap();

    assert_eq!(collection.items.len(), 2);
    assert_eq!(collection.stop_reason, StopReason::TargetReached);
    assert_eq!(captured.lock().unwrap().len(), 1);
}
