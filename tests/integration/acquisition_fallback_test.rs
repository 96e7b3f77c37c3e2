// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::integration::helpers::{client_for, spawn_upstream};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use placewatch::domain::models::place::{RankLookup, SearchConstraints, SearchQuery};
use placewatch::engines::markup_engine::MarkupTier;
use placewatch::engines::structured_api::StructuredApiTier;
use placewatch::engines::{AcquisitionTier, FetchError, TierError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

type Captured = Arc<Mutex<Vec<Value>>>;

const SEARCH_DOCUMENT: &str = r#"<!doctype html>
<html><head><script>
window.__APOLLO_STATE__ = {"ROOT_QUERY":{"__typename":"Query"},"PlaceSummary:11":{"__typename":"PlaceSummary","id":"11","name":"을지로 국수","category":"국수","visitorReviewCount":"2,048","visitorReviewScore":"4.42"},"PlaceSummary:22":{"__typename":"PlaceSummary","id":"22","name":"종로 칼국수","category":"칼국수","visitorReviewCount":"87"},"PlaceSummary:33":{"__typename":"PlaceSummary","id":"33","name":"명동 냉면","category":"냉면"}};
</script></head><body></body></html>"#;

async fn empty_places(State(captured): State<Captured>, Json(body): Json<Value>) -> Json<Value> {
    captured.lock().unwrap().push(body);
    Json(json!([{ "data": { "places": { "total": 0, "items": [] } } }]))
}

async fn upstream() -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/graphql", post(empty_places))
        .route(
            "/limited",
            post(|| async { StatusCode::TOO_MANY_REQUESTS.into_response() }),
        )
        .route("/search", get(|| async { Html(SEARCH_DOCUMENT) }))
        .route("/broken/search", get(|| async { Html("<html>maintenance</html>") }))
        .with_state(captured.clone());

    (spawn_upstream(app).await, captured)
}

#[tokio::test]
async fn test_empty_api_result_falls_back_to_markup() {
    let (base, captured) = upstream().await;
    let tiers: Vec<Arc<dyn AcquisitionTier>> = vec![
        Arc::new(StructuredApiTier::new(format!("{}/graphql", base), base.clone())),
        Arc::new(MarkupTier::new(base.clone())),
    ];
    let client = client_for(tiers);

    let lookup = client
        .find_rank(&SearchQuery::new("국수 맛집"), "22", &SearchConstraints::default())
        .await
        .unwrap();

    match lookup {
        RankLookup::Found(hit) => {
            assert_eq!(hit.rank, 2);
            assert_eq!(hit.name, "종로 칼국수");
            assert_eq!(hit.visitor_review_count, 87);
            assert!(hit.is_target);
        }
        other => panic!("expected target to be found, got {:?}", other),
    }

    // The structured tier was tried exactly once before falling back
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_markup_counts_are_normalized() {
    let (base, _) = upstream().await;
    let tiers: Vec<Arc<dyn AcquisitionTier>> = vec![Arc::new(MarkupTier::new(base))];
    let client = client_for(tiers);

    let results = client
        .fetch(&SearchQuery::new("국수"), &SearchConstraints::default())
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].visitor_review_count, 2048);
    assert_eq!(results[0].rating, Some(4.42));
    assert_eq!(results[2].visitor_review_count, 0);
    assert_eq!(results[2].rating, None);
    assert!(results.iter().all(|r| !r.is_target));
}

#[tokio::test]
async fn test_target_missing_is_not_an_error() {
    let (base, _) = upstream().await;
    let tiers: Vec<Arc<dyn AcquisitionTier>> = vec![Arc::new(MarkupTier::new(base))];
    let client = client_for(tiers);

    let lookup = client
        .find_rank(&SearchQuery::new("국수"), "99", &SearchConstraints::default())
        .await
        .unwrap();

    assert_eq!(lookup, RankLookup::NotFound { scanned: 3 });
}

#[tokio::test]
async fn test_oversized_page_size_is_clamped() {
    let (base, captured) = upstream().await;
    let tiers: Vec<Arc<dyn AcquisitionTier>> = vec![Arc::new(StructuredApiTier::new(
        format!("{}/graphql", base),
        base.clone(),
    ))];
    let client = client_for(tiers);

    let constraints = SearchConstraints {
        limit: 300,
        page_size: 500,
        max_pages: 3,
    };
    let result = client.fetch(&SearchQuery::new("카페"), &constraints).await;
    assert!(result.is_err());

    let bodies = captured.lock().unwrap();
    assert_eq!(bodies[0][0]["variables"]["input"]["display"], 100);
    assert_eq!(bodies[0][0]["variables"]["input"]["start"], 1);
}

#[tokio::test]
async fn test_every_tier_failing_reports_each_attempt() {
    let (base, _) = upstream().await;
    let tiers: Vec<Arc<dyn AcquisitionTier>> = vec![
        Arc::new(StructuredApiTier::new(format!("{}/limited", base), base.clone())),
        Arc::new(MarkupTier::new(format!("{}/broken", base))),
    ];
    let client = client_for(tiers);

    let err = client
        .fetch(&SearchQuery::new("카페"), &SearchConstraints::default())
        .await
        .unwrap_err();

    match err {
        FetchError::AllTiersFailed { attempts } => {
            assert_eq!(attempts.len(), 2);
            assert_eq!(attempts[0].tier, "structured_api");
            assert_eq!(attempts[0].error, TierError::RateLimited(429));
            assert_eq!(attempts[1].tier, "markup");
            assert!(matches!(attempts[1].error, TierError::Parse(_)));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_blank_keyword_is_rejected_before_any_request() {
    let (base, captured) = upstream().await;
    let tiers: Vec<Arc<dyn AcquisitionTier>> = vec![Arc::new(StructuredApiTier::new(
        format!("{}/graphql", base),
        base.clone(),
    ))];
    let client = client_for(tiers);

    let err = client
        .fetch(&SearchQuery::new("   "), &SearchConstraints::default())
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::InvalidQuery(_)));
    assert!(captured.lock().unwrap().is_empty());
}
