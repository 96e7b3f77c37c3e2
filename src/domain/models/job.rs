// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// 回复任务状态
///
/// 状态转换：Queued → Processing → Completed/Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 排队中
    #[default]
    Queued,
    /// 执行中
    Processing,
    /// 已完成
    Completed,
    /// 已失败
    Failed,
}

impl JobStatus {
    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// 会话 Cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
}

/// 调用方提供的已认证会话
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default)]
    pub cookies: Vec<SessionCookie>,
}

/// 回复任务负载
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPayload {
    /// 地点标识
    pub place_id: String,
    /// 评论标识
    pub review_id: String,
    /// 回复内容
    pub reply_text: String,
    /// 评论日期，用于估算自动化查找耗时
    #[serde(default)]
    pub review_date: Option<NaiveDate>,
    /// 会话上下文
    #[serde(default)]
    pub session: SessionContext,
}

impl ReplyPayload {
    /// 任务目标引用
    pub fn target(&self) -> String {
        format!("{}/{}", self.place_id, self.review_id)
    }
}

/// 回复任务
///
/// 由回复队列独占持有
#[derive(Debug, Clone)]
pub struct Job {
    /// 任务标识
    pub id: Uuid,
    /// 目标引用
    pub target: String,
    /// 负载
    pub payload: ReplyPayload,
    /// 状态
    pub status: JobStatus,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 开始时间
    pub started_at: Option<DateTime<Utc>>,
    /// 完成时间
    pub completed_at: Option<DateTime<Utc>>,
    /// 错误信息
    pub error: Option<String>,
    /// 预计耗时
    pub estimated_duration: Duration,
    /// 队列位置
    pub queue_position: Option<usize>,
    /// 最近一次轮询（单调时钟）
    pub last_polled: Instant,
    /// 进入终止状态的时间（单调时钟）
    pub finished: Option<Instant>,
    /// 是否因客户端断开而被取消
    pub cancelled: bool,
}

impl Job {
    pub fn new(payload: ReplyPayload, estimated_duration: Duration, now: Instant) -> Self {
        Self {
            id: Uuid::new_v4(),
            target: payload.target(),
            payload,
            status: JobStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
            estimated_duration,
            queue_position: None,
            last_polled: now,
            finished: None,
            cancelled: false,
        }
    }

    /// 距上次轮询是否已超过给定时长
    pub fn is_abandoned(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_polled) > timeout
    }

    /// 生成对外的状态文档
    pub fn status_document(&self) -> JobStatusDocument {
        JobStatusDocument {
            id: self.id,
            status: self.status,
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            error: self.error.clone(),
            estimated_time: self.estimated_duration.as_secs(),
            position_in_queue: if self.status == JobStatus::Queued {
                self.queue_position
            } else {
                None
            },
        }
    }
}

/// 轮询返回的状态文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusDocument {
    pub id: Uuid,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    /// 预计耗时（秒）
    pub estimated_time: u64,
    pub position_in_queue: Option<usize>,
}

/// 根据评论年龄估算自动化耗时
///
/// 越旧的评论需要在管理页面中翻找越久
pub fn estimate_duration(review_date: Option<NaiveDate>, today: NaiveDate) -> Duration {
    let age_days = match review_date {
        Some(date) => (today - date).num_days().max(0),
        None => return Duration::from_secs(180),
    };

    let secs = match age_days {
        0..=7 => 30,
        8..=30 => 60,
        31..=90 => 120,
        _ => 180,
    };
    Duration::from_secs(secs)
}
