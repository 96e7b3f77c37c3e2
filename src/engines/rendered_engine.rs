// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::place::{FetchResult, SearchConstraints, SearchQuery};
use crate::engines::traits::{AcquisitionTier, TierContext, TierError};
use crate::infrastructure::browser::BrowserLauncher;
use crate::utils::number_format::{normalize_rating_str, parse_count};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// 渲染后 DOM 的选择器
#[derive(Debug, Clone)]
pub struct RenderedSelectors {
    pub item: String,
    pub id_attr: String,
    pub name: String,
    pub category: String,
    pub visitor_reviews: String,
    pub blog_reviews: String,
    pub rating: String,
}

impl Default for RenderedSelectors {
    fn default() -> Self {
        Self {
            item: "li[data-place-id]".to_string(),
            id_attr: "data-place-id".to_string(),
            name: "[data-field=name]".to_string(),
            category: "[data-field=category]".to_string(),
            visitor_reviews: "[data-field=visitor-reviews]".to_string(),
            blog_reviews: "[data-field=blog-reviews]".to_string(),
            rating: "[data-field=rating]".to_string(),
        }
    }
}

/// 渲染抓取层
///
/// 驱动完整的浏览器渲染页面并直接读取 DOM。比其他层慢一个数量级，
/// 只作为最后手段。
pub struct RenderedCrawlTier {
    launcher: Arc<BrowserLauncher>,
    search_url: String,
    selectors: RenderedSelectors,
    settle_delay: Duration,
}

impl RenderedCrawlTier {
    pub fn new(launcher: Arc<BrowserLauncher>, search_url: impl Into<String>) -> Self {
        Self {
            launcher,
            search_url: search_url.into(),
            selectors: RenderedSelectors::default(),
            settle_delay: Duration::from_millis(1500),
        }
    }

    pub fn with_selectors(mut self, selectors: RenderedSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    async fn render(&self, url: &str) -> Result<String, TierError> {
        let browser = self.launcher.browser().await.map_err(TierError::Network)?;
        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                self.launcher.invalidate().await;
                return Err(TierError::Network(e.to_string()));
            }
        };

        let result = async {
            page.goto(url)
                .await
                .map_err(|e| TierError::Network(e.to_string()))?;
            // Client-side list hydration happens after the load event
            tokio::time::sleep(self.settle_delay).await;
            page.content()
                .await
                .map_err(|e| TierError::Parse(e.to_string()))
        }
        .await;

        if let Err(e) = page.close().await {
            warn!("Failed to close rendered page: {}", e);
        }
        result
    }
}

/// 从渲染后的 HTML 中解析地点列表
pub fn parse_rendered_list(
    html: &str,
    selectors: &RenderedSelectors,
    query: &SearchQuery,
) -> Result<Vec<FetchResult>, TierError> {
    let parse = |s: &str| Selector::parse(s).map_err(|e| TierError::Parse(format!("selector {}: {}", s, e)));
    let item_selector = parse(&selectors.item)?;
    let name_selector = parse(&selectors.name)?;
    let category_selector = parse(&selectors.category)?;
    let visitor_selector = parse(&selectors.visitor_reviews)?;
    let blog_selector = parse(&selectors.blog_reviews)?;
    let rating_selector = parse(&selectors.rating)?;

    let document = Html::parse_document(html);
    let text_of = |element: &ElementRef, selector: &Selector| -> Option<String> {
        element
            .select(selector)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    };

    let mut results = Vec::new();
    for element in document.select(&item_selector) {
        let Some(id) = element.value().attr(&selectors.id_attr) else {
            continue;
        };
        let Some(name) = text_of(&element, &name_selector) else {
            continue;
        };

        results.push(FetchResult {
            id: id.to_string(),
            name,
            category: text_of(&element, &category_selector),
            rank: results.len() as u32 + 1,
            visitor_review_count: text_of(&element, &visitor_selector).map_or(0, |t| parse_count(&t)),
            blog_review_count: text_of(&element, &blog_selector).map_or(0, |t| parse_count(&t)),
            rating: text_of(&element, &rating_selector).and_then(|t| normalize_rating_str(&t)),
            is_target: query.is_target(id),
        });
    }

    Ok(results)
}

#[async_trait]
impl AcquisitionTier for RenderedCrawlTier {
    async fn search(
        &self,
        query: &SearchQuery,
        constraints: &SearchConstraints,
        ctx: &TierContext,
    ) -> Result<Vec<FetchResult>, TierError> {
        let url = Url::parse_with_params(&self.search_url, &[("query", query.keyword.as_str())])
            .map_err(|e| TierError::Parse(e.to_string()))?;

        if ctx.proxy.is_some() {
            debug!("Rendered tier uses the browser's own egress, proxy ignored");
        }

        ctx.pace().await;
        let html = tokio::time::timeout(ctx.timeout, self.render(url.as_str()))
            .await
            .map_err(|_| TierError::Network("render timed out".to_string()))??;

        let mut results = parse_rendered_list(&html, &self.selectors, query)?;
        if results.is_empty() {
            return Err(TierError::Empty);
        }
        results.truncate(constraints.limit);
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "rendered_crawl"
    }
}
