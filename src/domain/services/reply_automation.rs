// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::ReplyPayload;
use async_trait::async_trait;
use thiserror::Error;

/// 自动化错误类型
#[derive(Error, Debug)]
pub enum AutomationError {
    /// 会话已过期，重试无意义
    #[error("Session expired")]
    SessionExpired,
    /// 未找到要回复的评论
    #[error("Review {0} not found")]
    ReviewNotFound(String),
    /// 浏览器操作失败
    #[error("Browser error: {0}")]
    Browser(String),
    /// 超时
    #[error("Timeout after {0}s")]
    Timeout(u64),
}

/// 回复执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// 已发布
    Posted,
    /// 写入前检测到已有回复，未做任何修改
    AlreadyReplied,
}

/// 回复自动化能力
///
/// 同一外部账号的浏览器会话不能并行，调用方需保证串行执行
#[async_trait]
pub trait ReplyAutomation: Send + Sync {
    /// 发布回复
    async fn post_reply(&self, payload: &ReplyPayload) -> Result<ReplyOutcome, AutomationError>;

    /// 实现名称
    fn name(&self) -> &'static str;
}
