// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::review::{
    CollectionRequest, CollectionWindow, ReviewItem, ReviewPage, ReviewPageRequest, WindowScaling,
};
use crate::engines::router::AcquisitionClient;
use crate::engines::traits::FetchError;
use crate::utils::date_parser::parse_review_date;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 基于游标的评论来源
#[async_trait]
pub trait ReviewFeed: Send + Sync {
    /// 获取一页评论，`request.after` 为上一页返回的游标
    async fn fetch_page(&self, request: &ReviewPageRequest) -> Result<ReviewPage, FetchError>;
}

#[async_trait]
impl ReviewFeed for AcquisitionClient {
    async fn fetch_page(&self, request: &ReviewPageRequest) -> Result<ReviewPage, FetchError> {
        self.fetch_reviews(request).await
    }
}

/// 收集结束的原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// 达到目标数量
    TargetReached,
    /// 已收集到窗口内条目后遇到早于窗口的条目
    PastWindow,
    /// 整页都是重复条目，游标可能在循环
    NoFreshItems,
    /// 没有下一页
    EndOfFeed,
    /// 用完页数预算
    PageBudget,
    /// 后续页抓取失败，返回已收集的部分
    Interrupted(String),
}

/// 一次收集的结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub items: Vec<ReviewItem>,
    pub pages_fetched: u32,
    pub stop_reason: StopReason,
    /// 窗口内没有任何条目时，返回的是第一页的窗口前条目
    pub first_page_fallback: bool,
}

/// 评论收集器
///
/// 沿游标逐页收集，按条目标识去重，并根据条目日期提前结束
pub struct ReviewCollector<F: ReviewFeed + ?Sized> {
    feed: Arc<F>,
    scaling: WindowScaling,
    page_size: usize,
}

impl<F: ReviewFeed + ?Sized> ReviewCollector<F> {
    pub fn new(feed: Arc<F>, scaling: WindowScaling) -> Self {
        Self {
            feed,
            scaling,
            page_size: 20,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// 按窗口长度缩放后的收集窗口
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> CollectionWindow {
        CollectionWindow::scaled(start, end, &self.scaling)
    }

    /// 收集窗口内的评论
    pub async fn collect(
        &self,
        place_id: &str,
        window: CollectionWindow,
    ) -> Result<Collection, FetchError> {
        self.collect_at(place_id, &CollectionRequest::Window(window), Utc::now().naive_utc())
            .await
    }

    /// 收集最新的 `count` 条评论
    pub async fn collect_latest(&self, place_id: &str, count: usize) -> Result<Collection, FetchError> {
        let pages = count.div_ceil(self.page_size) as u32 + 1;
        let request = CollectionRequest::Count {
            target_count: count,
            max_pages: pages.min(self.scaling.max_pages_cap),
        };
        self.collect_at(place_id, &request, Utc::now().naive_utc()).await
    }

    /// 以给定的参考时间收集
    ///
    /// 第一页抓取失败时返回错误；之后的失败只结束收集并返回已有条目
    pub async fn collect_at(
        &self,
        place_id: &str,
        request: &CollectionRequest,
        reference: NaiveDateTime,
    ) -> Result<Collection, FetchError> {
        let target = request.target_count();
        let max_pages = request.max_pages();

        let mut seen: HashSet<String> = HashSet::new();
        let mut items: Vec<ReviewItem> = Vec::new();
        let mut pre_window: Vec<ReviewItem> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages_fetched = 0u32;

        let stop_reason = loop {
            if items.len() >= target {
                break StopReason::TargetReached;
            }
            if pages_fetched >= max_pages {
                break StopReason::PageBudget;
            }

            let page_request = ReviewPageRequest {
                place_id: place_id.to_string(),
                after: cursor.clone(),
                page_size: self.page_size,
            };
            let page = match self.feed.fetch_page(&page_request).await {
                Ok(page) => page,
                Err(e) if pages_fetched == 0 => return Err(e),
                Err(e) => {
                    warn!(
                        "Review page {} for {} failed, keeping {} items: {}",
                        pages_fetched + 1,
                        place_id,
                        items.len(),
                        e
                    );
                    break StopReason::Interrupted(e.to_string());
                }
            };
            pages_fetched += 1;

            let mut fresh = 0usize;
            let mut past_window = false;
            for mut item in page.items {
                if !seen.insert(item.id.clone()) {
                    continue;
                }
                fresh += 1;
                item.date = parse_review_date(&item.raw_date, reference);

                if let CollectionRequest::Window(window) = request {
                    match item.date {
                        Some(date) if date > window.end => continue,
                        Some(date) if date < window.start => {
                            if !items.is_empty() {
                                past_window = true;
                                break;
                            }
                            // Nothing in window yet, keep walking
                            if pages_fetched == 1 {
                                pre_window.push(item);
                            }
                            continue;
                        }
                        _ => {}
                    }
                }

                items.push(item);
                if items.len() >= target {
                    break;
                }
            }

            debug!(
                page = pages_fetched,
                fresh,
                collected = items.len(),
                "review page processed"
            );

            if past_window {
                break StopReason::PastWindow;
            }
            if items.len() >= target {
                break StopReason::TargetReached;
            }
            if fresh == 0 {
                break StopReason::NoFreshItems;
            }
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break StopReason::EndOfFeed,
            }
        };

        let first_page_fallback = items.is_empty() && !pre_window.is_empty();
        if first_page_fallback {
            info!(
                "No reviews of {} inside window, returning {} recent ones from the first page",
                place_id,
                pre_window.len()
            );
            items = pre_window;
            items.truncate(target);
        }

        info!(
            "Collected {} reviews for {} over {} pages ({:?})",
            items.len(),
            place_id,
            pages_fetched,
            stop_reason
        );

        Ok(Collection {
            items,
            pages_fetched,
            stop_reason,
            first_page_fallback,
        })
    }
}

#[cfg(test)]
#[path = "review_collector_test.rs"]
mod tests;
