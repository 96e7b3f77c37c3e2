// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::place::{FetchResult, SearchConstraints, SearchQuery};
use crate::domain::models::review::{ReviewPage, ReviewPageRequest};
use crate::engines::pacer::RequestPacer;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// 抓取层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TierError {
    /// 连接失败或超时
    #[error("Network error: {0}")]
    Network(String),
    /// HTTP 429 或被封禁
    #[error("Rate limited (status {0})")]
    RateLimited(u16),
    /// 响应结构不匹配
    #[error("Parse error: {0}")]
    Parse(String),
    /// 响应成功但为空
    #[error("Empty result")]
    Empty,
    /// 该层不支持此操作
    #[error("Operation not supported")]
    Unsupported,
    /// 会话过期
    #[error("Session expired")]
    SessionExpired,
}

impl TierError {
    /// 判断错误是否值得在同一层换代理重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, TierError::Network(_) | TierError::RateLimited(_))
    }

    /// 判断错误是否应计入代理的失败次数
    pub fn rotates_proxy(&self) -> bool {
        self.is_retryable()
    }

    /// 根据 HTTP 状态码分类
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS | StatusCode::FORBIDDEN => {
                TierError::RateLimited(status.as_u16())
            }
            s if s.is_server_error() => TierError::Network(format!("upstream status {}", s)),
            s => TierError::Parse(format!("unexpected status {}", s)),
        }
    }
}

impl From<reqwest::Error> for TierError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return TierError::from_status(status);
        }
        if e.is_decode() {
            return TierError::Parse(e.to_string());
        }
        TierError::Network(e.to_string())
    }
}

/// 单次抓取层调用的上下文
#[derive(Clone)]
pub struct TierContext {
    /// 本次调用使用的代理，为空表示直连
    pub proxy: Option<String>,
    /// 请求超时
    pub timeout: Duration,
    /// 客户端级别的请求节流器
    pub pacer: Arc<RequestPacer>,
}

impl TierContext {
    /// 在每次外发请求前调用
    pub async fn pace(&self) {
        self.pacer.wait().await;
    }
}

impl fmt::Debug for TierContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TierContext")
            .field("proxy", &self.proxy)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// 抓取层特质
///
/// 每个实现是回退链中的一种传输策略，由 `AcquisitionClient` 按顺序驱动
#[async_trait]
pub trait AcquisitionTier: Send + Sync {
    /// 搜索地点
    async fn search(
        &self,
        query: &SearchQuery,
        constraints: &SearchConstraints,
        ctx: &TierContext,
    ) -> Result<Vec<FetchResult>, TierError>;

    /// 获取一页评论
    async fn fetch_reviews(
        &self,
        _request: &ReviewPageRequest,
        _ctx: &TierContext,
    ) -> Result<ReviewPage, TierError> {
        Err(TierError::Unsupported)
    }

    /// 层名称
    fn name(&self) -> &'static str;
}

/// 某一层的失败记录
#[derive(Debug, Clone, PartialEq)]
pub struct TierAttempt {
    pub tier: &'static str,
    pub error: TierError,
}

impl fmt::Display for TierAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.tier, self.error)
    }
}

/// 调用方可见的抓取错误
#[derive(Error, Debug)]
pub enum FetchError {
    /// 所有抓取层都失败
    #[error("All tiers failed: [{}]", format_attempts(.attempts))]
    AllTiersFailed { attempts: Vec<TierAttempt> },
    /// 会话过期，不重试
    #[error("Session expired in tier {tier}")]
    SessionExpired { tier: &'static str },
    /// 查询无效
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

fn format_attempts(attempts: &[TierAttempt]) -> String {
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// 构建带代理和超时的 HTTP 客户端
pub(crate) fn build_http_client(
    ctx: &TierContext,
    user_agent: &str,
) -> Result<reqwest::Client, TierError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(ctx.timeout)
        .cookie_store(true);

    if let Some(proxy_url) = &ctx.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| TierError::Network(format!("Invalid proxy: {}", e)))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| TierError::Network(format!("Failed to build client: {}", e)))
}
