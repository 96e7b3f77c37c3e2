// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::place::{FetchResult, RankLookup, SearchConstraints, SearchQuery};
use crate::domain::models::review::{ReviewPage, ReviewPageRequest};
use crate::engines::pacer::RequestPacer;
use crate::engines::traits::{AcquisitionTier, FetchError, TierAttempt, TierContext, TierError};
use crate::infrastructure::proxy::ProxyPool;
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// 在单个抓取层上执行的一次逻辑操作
#[async_trait]
trait TierCall: Send + Sync {
    type Output: Send;

    async fn call(
        &self,
        tier: &dyn AcquisitionTier,
        ctx: &TierContext,
    ) -> Result<Self::Output, TierError>;
}

struct SearchCall<'a> {
    query: &'a SearchQuery,
    constraints: &'a SearchConstraints,
}

#[async_trait]
impl<'a> TierCall for SearchCall<'a> {
    type Output = Vec<FetchResult>;

    async fn call(
        &self,
        tier: &dyn AcquisitionTier,
        ctx: &TierContext,
    ) -> Result<Vec<FetchResult>, TierError> {
        tier.search(self.query, self.constraints, ctx).await
    }
}

struct ReviewPageCall<'a> {
    request: &'a ReviewPageRequest,
}

#[async_trait]
impl<'a> TierCall for ReviewPageCall<'a> {
    type Output = ReviewPage;

    async fn call(
        &self,
        tier: &dyn AcquisitionTier,
        ctx: &TierContext,
    ) -> Result<ReviewPage, TierError> {
        tier.fetch_reviews(self.request, ctx).await
    }
}

/// 抓取客户端
///
/// 按顺序驱动回退链中的各个抓取层，直到某一层成功或全部失败。
/// 层内的网络错误和限流会换代理并退避重试；解析错误、空结果和不支持
/// 直接进入下一层；会话过期立即返回。
pub struct AcquisitionClient {
    /// 按优先级排列的抓取层
    tiers: Vec<Arc<dyn AcquisitionTier>>,
    /// 出口代理池
    pool: Arc<ProxyPool>,
    /// 本实例的请求节流器
    pacer: Arc<RequestPacer>,
    /// 层内重试策略
    retry_policy: RetryPolicy,
    /// 单次请求超时
    request_timeout: Duration,
}

impl AcquisitionClient {
    pub fn new(tiers: Vec<Arc<dyn AcquisitionTier>>, pool: Arc<ProxyPool>) -> Self {
        Self {
            tiers,
            pool,
            pacer: Arc::new(RequestPacer::new(Duration::from_millis(1000))),
            retry_policy: RetryPolicy::standard(),
            request_timeout: Duration::from_secs(15),
        }
    }

    pub fn with_pacer(mut self, pacer: RequestPacer) -> Self {
        self.pacer = Arc::new(pacer);
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    pub fn pool(&self) -> &Arc<ProxyPool> {
        &self.pool
    }

    /// 搜索地点
    pub async fn fetch(
        &self,
        query: &SearchQuery,
        constraints: &SearchConstraints,
    ) -> Result<Vec<FetchResult>, FetchError> {
        if query.keyword.trim().is_empty() {
            return Err(FetchError::InvalidQuery("keyword is empty".to_string()));
        }
        if constraints.limit == 0 {
            return Err(FetchError::InvalidQuery("limit must be positive".to_string()));
        }

        self.execute("search", &SearchCall { query, constraints })
            .await
    }

    /// 获取一页评论
    pub async fn fetch_reviews(&self, request: &ReviewPageRequest) -> Result<ReviewPage, FetchError> {
        if request.place_id.trim().is_empty() {
            return Err(FetchError::InvalidQuery("place id is empty".to_string()));
        }

        self.execute("reviews", &ReviewPageCall { request }).await
    }

    /// 查找目标地点在关键词搜索结果中的排名
    ///
    /// 目标不在结果中时返回 `RankLookup::NotFound`，不是错误
    pub async fn find_rank(
        &self,
        query: &SearchQuery,
        target_id: &str,
        constraints: &SearchConstraints,
    ) -> Result<RankLookup, FetchError> {
        let query = query.clone().with_target(target_id);
        let results = self.fetch(&query, constraints).await?;
        let lookup = RankLookup::from_results(&results);
        debug!(
            keyword = %query.keyword,
            target = target_id,
            rank = ?lookup.rank(),
            "rank lookup finished"
        );
        Ok(lookup)
    }

    async fn execute<C: TierCall>(
        &self,
        operation: &'static str,
        call: &C,
    ) -> Result<C::Output, FetchError> {
        let started = Instant::now();
        let mut attempts = Vec::new();

        for tier in &self.tiers {
            let tier_name = tier.name();
            let mut retry = 0u32;

            let error = loop {
                let proxy = self.pool.acquire();
                let ctx = TierContext {
                    proxy: proxy.clone(),
                    timeout: self.request_timeout,
                    pacer: self.pacer.clone(),
                };

                let attempt_start = Instant::now();
                match call.call(tier.as_ref(), &ctx).await {
                    Ok(output) => {
                        if let Some(egress) = &proxy {
                            self.pool.report_success(egress, attempt_start.elapsed());
                        }
                        counter!("acquisition_tier_attempts_total", "tier" => tier_name, "outcome" => "success")
                            .increment(1);
                        info!(
                            "Tier {} served {} in {:?}, total time: {:?}",
                            tier_name,
                            operation,
                            attempt_start.elapsed(),
                            started.elapsed()
                        );
                        return Ok(output);
                    }
                    Err(e) => {
                        counter!("acquisition_tier_attempts_total", "tier" => tier_name, "outcome" => "failure")
                            .increment(1);
                        if let Some(egress) = &proxy {
                            if e.rotates_proxy() {
                                self.pool.report_failure(egress, &e.to_string());
                            }
                        }

                        if e == TierError::SessionExpired {
                            warn!("Tier {} reported an expired session", tier_name);
                            return Err(FetchError::SessionExpired { tier: tier_name });
                        }

                        if e.is_retryable() && self.retry_policy.should_retry(retry) {
                            retry += 1;
                            let backoff = self.retry_policy.calculate_backoff(retry);
                            warn!(
                                "Tier {} failed with retryable error: {}, retry {}/{} in {:?}",
                                tier_name, e, retry, self.retry_policy.max_retries, backoff
                            );
                            tokio::time::sleep(backoff).await;
                            continue;
                        }

                        break e;
                    }
                }
            };

            // Back off once more before hitting the next tier with the same traffic
            if let TierError::RateLimited(_) = error {
                let backoff = self.retry_policy.calculate_backoff(retry + 1);
                tokio::time::sleep(backoff).await;
            }

            warn!("Tier {} failed: {}, trying next tier", tier_name, error);
            attempts.push(TierAttempt {
                tier: tier_name,
                error,
            });
        }

        warn!(
            "All {} tiers failed for {} after {:?}",
            attempts.len(),
            operation,
            started.elapsed()
        );
        Err(FetchError::AllTiersFailed { attempts })
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
