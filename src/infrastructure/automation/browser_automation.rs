// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{ReplyPayload, SessionContext};
use crate::domain::services::reply_automation::{AutomationError, ReplyAutomation, ReplyOutcome};
use crate::infrastructure::browser::BrowserLauncher;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 管理页面上的元素选择器
#[derive(Debug, Clone)]
pub struct ReplySelectors {
    /// 已有回复（在评论元素内查找）
    pub existing_reply: String,
    /// 打开回复输入框的按钮
    pub reply_button: String,
    /// 回复输入框
    pub reply_input: String,
    /// 提交按钮
    pub submit_button: String,
}

impl Default for ReplySelectors {
    fn default() -> Self {
        Self {
            existing_reply: ".reply_content".to_string(),
            reply_button: "button.reply_write".to_string(),
            reply_input: "textarea".to_string(),
            submit_button: "button.reply_submit".to_string(),
        }
    }
}

/// 基于 chromiumoxide 的回复自动化
///
/// 使用调用方提供的会话 Cookie 打开评论管理页，找到评论后写入回复。
/// 写入之前会检查评论是否已有回复，已有则不做任何修改。
pub struct BrowserReplyAutomation {
    launcher: Arc<BrowserLauncher>,
    /// 评论管理页地址，`{place_id}` 会被替换
    reviews_url: String,
    /// 落地地址包含此片段时视为会话过期（被重定向到登录页）
    login_marker: String,
    selectors: ReplySelectors,
    navigation_timeout: Duration,
    max_scrolls: u32,
}

impl BrowserReplyAutomation {
    pub fn new(launcher: Arc<BrowserLauncher>, reviews_url: impl Into<String>) -> Self {
        Self {
            launcher,
            reviews_url: reviews_url.into(),
            login_marker: "/login".to_string(),
            selectors: ReplySelectors::default(),
            navigation_timeout: Duration::from_secs(120),
            max_scrolls: 30,
        }
    }

    pub fn with_login_marker(mut self, marker: impl Into<String>) -> Self {
        self.login_marker = marker.into();
        self
    }

    pub fn with_selectors(mut self, selectors: ReplySelectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    fn page_url(&self, place_id: &str) -> String {
        self.reviews_url.replace("{place_id}", place_id)
    }

    fn is_login_redirect(&self, landed: &str) -> bool {
        landed.contains(&self.login_marker)
    }

    async fn reply_on_page(
        &self,
        page: &Page,
        payload: &ReplyPayload,
    ) -> Result<ReplyOutcome, AutomationError> {
        let cookies = cookie_params(&payload.session)?;
        if !cookies.is_empty() {
            page.set_cookies(cookies).await.map_err(browser_error)?;
        }

        let url = self.page_url(&payload.place_id);
        page.goto(url.as_str()).await.map_err(browser_error)?;

        let landed = page.url().await.map_err(browser_error)?.unwrap_or_default();
        if self.is_login_redirect(&landed) {
            warn!("Redirected to {} while opening reviews, session expired", landed);
            return Err(AutomationError::SessionExpired);
        }

        let review = self.find_review(page, &payload.review_id).await?;

        if review
            .find_element(self.selectors.existing_reply.as_str())
            .await
            .is_ok()
        {
            return Ok(ReplyOutcome::AlreadyReplied);
        }

        review
            .find_element(self.selectors.reply_button.as_str())
            .await
            .map_err(browser_error)?
            .click()
            .await
            .map_err(browser_error)?;

        review
            .find_element(self.selectors.reply_input.as_str())
            .await
            .map_err(browser_error)?
            .click()
            .await
            .map_err(browser_error)?
            .type_str(&payload.reply_text)
            .await
            .map_err(browser_error)?;

        review
            .find_element(self.selectors.submit_button.as_str())
            .await
            .map_err(browser_error)?
            .click()
            .await
            .map_err(browser_error)?;

        info!("Reply submitted for review {}", payload.review_id);
        Ok(ReplyOutcome::Posted)
    }

    /// 查找评论元素，找不到时向下滚动加载更早的评论
    async fn find_review(&self, page: &Page, review_id: &str) -> Result<Element, AutomationError> {
        let selector = format!(r#"[data-review-id="{}"]"#, review_id);

        for scroll in 0..=self.max_scrolls {
            if let Ok(element) = page.find_element(selector.as_str()).await {
                debug!("Review {} found after {} scrolls", review_id, scroll);
                return Ok(element);
            }
            page.evaluate("window.scrollTo(0, document.body.scrollHeight);")
                .await
                .map_err(browser_error)?;
            tokio::time::sleep(Duration::from_millis(1000)).await;
        }

        Err(AutomationError::ReviewNotFound(review_id.to_string()))
    }
}

#[async_trait]
impl ReplyAutomation for BrowserReplyAutomation {
    async fn post_reply(&self, payload: &ReplyPayload) -> Result<ReplyOutcome, AutomationError> {
        let browser = self
            .launcher
            .browser()
            .await
            .map_err(AutomationError::Browser)?;
        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                self.launcher.invalidate().await;
                return Err(browser_error(e));
            }
        };

        let result = match tokio::time::timeout(
            self.navigation_timeout,
            self.reply_on_page(&page, payload),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AutomationError::Timeout(self.navigation_timeout.as_secs())),
        };

        if let Err(e) = page.close().await {
            warn!("Failed to close automation page: {}", e);
        }
        result
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}

fn browser_error(e: impl std::fmt::Display) -> AutomationError {
    AutomationError::Browser(e.to_string())
}

/// 将调用方的会话 Cookie 转换为 CDP 参数
fn cookie_params(session: &SessionContext) -> Result<Vec<CookieParam>, AutomationError> {
    session
        .cookies
        .iter()
        .map(|cookie| {
            CookieParam::builder()
                .name(cookie.name.clone())
                .value(cookie.value.clone())
                .domain(cookie.domain.clone())
                .path("/")
                .build()
                .map_err(AutomationError::Browser)
        })
        .collect()
}
