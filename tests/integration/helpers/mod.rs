// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use axum::Router;
use placewatch::domain::models::job::ReplyPayload;
use placewatch::domain::models::place::{FetchResult, SearchConstraints, SearchQuery};
use placewatch::domain::models::review::{ReviewItem, ReviewPage, ReviewPageRequest, WindowScaling};
use placewatch::domain::services::rank_service::RankService;
use placewatch::domain::services::reply_automation::{AutomationError, ReplyAutomation, ReplyOutcome};
use placewatch::domain::services::review_collector::{ReviewCollector, ReviewFeed};
use placewatch::engines::pacer::RequestPacer;
use placewatch::engines::{AcquisitionClient, AcquisitionTier, TierContext, TierError};
use placewatch::infrastructure::proxy::{ProxyPool, ProxyPoolConfig, ProxyProbe};
use placewatch::presentation::routes::AppServices;
use placewatch::queue::{ReplyQueue, ReplyQueueConfig};
use placewatch::utils::retry_policy::RetryPolicy;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// 在随机端口启动上游服务，返回基础地址
pub async fn spawn_upstream(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// 不节流、不重试、直连的抓取客户端
pub fn client_for(tiers: Vec<Arc<dyn AcquisitionTier>>) -> AcquisitionClient {
    let pool = Arc::new(ProxyPool::new(Vec::<String>::new(), ProxyPoolConfig::default()));
    AcquisitionClient::new(tiers, pool)
        .with_pacer(RequestPacer::unthrottled())
        .with_retry_policy(RetryPolicy::none())
        .with_request_timeout(Duration::from_secs(5))
}

/// 固定数据的抓取层
///
/// 搜索返回 `places` 中的地点；评论按游标返回 `reviews` 中的页
pub struct StaticTier {
    pub places: Vec<(&'static str, &'static str)>,
    pub reviews: Vec<(Option<&'static str>, Vec<ReviewItem>, Option<&'static str>)>,
}

#[async_trait]
impl AcquisitionTier for StaticTier {
    async fn search(
        &self,
        query: &SearchQuery,
        constraints: &SearchConstraints,
        _ctx: &TierContext,
    ) -> Result<Vec<FetchResult>, TierError> {
        if self.places.is_empty() {
            return Err(TierError::Empty);
        }
        Ok(self
            .places
            .iter()
            .take(constraints.limit)
            .enumerate()
            .map(|(index, (id, name))| FetchResult {
                id: id.to_string(),
                name: name.to_string(),
                category: None,
                rank: index as u32 + 1,
                visitor_review_count: 10,
                blog_review_count: 0,
                rating: None,
                is_target: query.is_target(id),
            })
            .collect())
    }

    async fn fetch_reviews(
        &self,
        request: &ReviewPageRequest,
        _ctx: &TierContext,
    ) -> Result<ReviewPage, TierError> {
        self.reviews
            .iter()
            .find(|(after, _, _)| *after == request.after.as_deref())
            .map(|(_, items, next)| ReviewPage {
                items: items.clone(),
                cursor: next.map(str::to_string),
            })
            .ok_or_else(|| TierError::Network("unknown cursor".to_string()))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

pub fn review(id: &str, raw_date: &str) -> ReviewItem {
    ReviewItem {
        id: id.to_string(),
        author: None,
        body: format!("review {}", id),
        rating: Some(5.0),
        raw_date: raw_date.to_string(),
        date: None,
        has_reply: false,
    }
}

/// 记录调用的回复自动化
#[derive(Default)]
pub struct RecordingAutomation {
    pub posted: Mutex<Vec<String>>,
}

#[async_trait]
impl ReplyAutomation for RecordingAutomation {
    async fn post_reply(&self, payload: &ReplyPayload) -> Result<ReplyOutcome, AutomationError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if payload.review_id == "gone" {
            return Err(AutomationError::ReviewNotFound(payload.review_id.clone()));
        }
        self.posted.lock().unwrap().push(payload.review_id.clone());
        Ok(ReplyOutcome::Posted)
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// 所有出口都可用的探测
pub struct AlwaysHealthyProbe;

#[async_trait]
impl ProxyProbe for AlwaysHealthyProbe {
    async fn probe(&self, _egress: &str) -> Result<Duration, String> {
        Ok(Duration::from_millis(15))
    }
}

/// 基于固定抓取层组装 HTTP 接口依赖
pub fn services(tier: StaticTier, proxies: &[&str]) -> AppServices {
    let pool = Arc::new(ProxyPool::new(
        proxies.iter().map(|p| p.to_string()),
        ProxyPoolConfig::default(),
    ));
    let tiers: Vec<Arc<dyn AcquisitionTier>> = vec![Arc::new(tier)];
    let client = Arc::new(
        AcquisitionClient::new(tiers, pool)
            .with_pacer(RequestPacer::unthrottled())
            .with_retry_policy(RetryPolicy::none()),
    );
    let feed: Arc<dyn ReviewFeed> = client.clone();

    AppServices {
        ranks: Arc::new(RankService::new(client.clone(), 3)),
        collector: Arc::new(ReviewCollector::new(feed, WindowScaling::default())),
        queue: Arc::new(ReplyQueue::new(ReplyQueueConfig::default())),
        probe: Arc::new(AlwaysHealthyProbe),
        constraints: SearchConstraints::default(),
        client,
    }
}
