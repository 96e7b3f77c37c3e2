// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::place::SearchConstraints;
use crate::domain::services::rank_service::RankService;
use crate::domain::services::review_collector::{ReviewCollector, ReviewFeed};
use crate::engines::AcquisitionClient;
use crate::infrastructure::proxy::{ProxyPool, ProxyProbe};
use crate::presentation::handlers::{proxy_handler, reply_handler, review_handler, search_handler};
use crate::queue::ReplyQueue;
use axum::{
    extract::Extension,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 路由依赖的服务
#[derive(Clone)]
pub struct AppServices {
    pub client: Arc<AcquisitionClient>,
    pub ranks: Arc<RankService>,
    pub collector: Arc<ReviewCollector<dyn ReviewFeed>>,
    pub queue: Arc<ReplyQueue>,
    pub probe: Arc<dyn ProxyProbe>,
    /// 搜索请求的默认约束
    pub constraints: SearchConstraints,
}

/// 创建应用路由
pub fn routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version))
        .route("/v1/search", post(search_handler::search))
        .route("/v1/ranks", post(search_handler::check_ranks))
        .route("/v1/reviews/collect", post(review_handler::collect_reviews))
        .route("/v1/replies", post(reply_handler::submit_reply))
        .route("/v1/replies/{id}", get(reply_handler::get_reply_status))
        .route("/v1/proxies", get(proxy_handler::list_proxies))
        .route("/v1/proxies/check", post(proxy_handler::check_proxies))
        .route("/v1/proxies/reset", post(proxy_handler::reset_proxies))
}

/// 创建挂载了全部服务的应用
pub fn app(services: AppServices) -> Router {
    let pool: Arc<ProxyPool> = services.client.pool().clone();

    routes()
        .layer(Extension(services.client))
        .layer(Extension(services.ranks))
        .layer(Extension(services.collector))
        .layer(Extension(services.queue))
        .layer(Extension(services.probe))
        .layer(Extension(services.constraints))
        .layer(Extension(pool))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
pub async fn health_check(
    Extension(client): Extension<Arc<AcquisitionClient>>,
    Extension(queue): Extension<Arc<ReplyQueue>>,
) -> Json<Value> {
    let pool = client.pool();
    Json(json!({
        "status": "ok",
        "tiers": client.tier_names(),
        "proxies": { "total": pool.len(), "active": pool.active_count() },
        "queue": { "depth": queue.depth(), "current": queue.current() },
    }))
}

/// 版本信息端点
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
