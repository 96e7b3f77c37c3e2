// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{estimate_duration, Job, JobStatus, JobStatusDocument, ReplyPayload};
use chrono::Utc;
use metrics::{counter, gauge};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 客户端停止轮询后任务失败时记录的错误
pub const CLIENT_DISCONNECTED: &str = "client disconnected";

/// 队列错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// 负载缺少必要字段
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// 队列已满
    #[error("Queue full ({0} jobs)")]
    QueueFull(usize),
}

/// 回复队列配置
#[derive(Debug, Clone)]
pub struct ReplyQueueConfig {
    /// 开始执行前，超过此时长未被轮询的任务视为客户端已断开
    pub liveness_timeout: Duration,
    /// 清理时，超过此时长未被轮询的排队任务会被移除，必须短于 `liveness_timeout`
    pub stale_queued_timeout: Duration,
    /// 终止状态任务的保留时长
    pub retention: Duration,
    /// 活跃任务（排队和执行中）上限
    pub capacity: usize,
}

impl Default for ReplyQueueConfig {
    fn default() -> Self {
        Self {
            liveness_timeout: Duration::from_secs(60),
            stale_queued_timeout: Duration::from_secs(30),
            retention: Duration::from_secs(600),
            capacity: 100,
        }
    }
}

#[derive(Default)]
struct QueueState {
    /// 所有未被清理的任务
    jobs: HashMap<Uuid, Job>,
    /// 活跃任务的先进先出顺序，执行中的任务位于队首
    active: VecDeque<Uuid>,
    /// 正在执行的任务
    current: Option<Uuid>,
}

impl QueueState {
    /// 按在活跃列表中的下标重新计算位置
    fn recompute_positions(&mut self) {
        for (position, id) in self.active.iter().enumerate() {
            if let Some(job) = self.jobs.get_mut(id) {
                job.queue_position = Some(position);
            }
        }
        gauge!("reply_queue_depth").set(self.active.len() as f64);
    }

    fn finish(&mut self, id: Uuid, status: JobStatus, error: Option<String>) -> bool {
        let Some(job) = self.jobs.get_mut(&id) else {
            return false;
        };
        job.status = status;
        job.error = error;
        job.completed_at = Some(Utc::now());
        job.finished = Some(Instant::now());
        job.queue_position = None;

        self.active.retain(|active| *active != id);
        if self.current == Some(id) {
            self.current = None;
        }
        self.recompute_positions();
        counter!("reply_jobs_total", "status" => status.to_string()).increment(1);
        true
    }
}

/// 回复写回队列
///
/// 单消费者的先进先出队列。任务状态只存在于进程内存中，
/// 轮询会刷新任务的存活时间戳。
pub struct ReplyQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    config: ReplyQueueConfig,
}

impl ReplyQueue {
    pub fn new(config: ReplyQueueConfig) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            config,
        }
    }

    pub fn config(&self) -> &ReplyQueueConfig {
        &self.config
    }

    /// 提交任务并返回任务标识
    pub fn submit(&self, payload: ReplyPayload) -> Result<Uuid, QueueError> {
        for (field, value) in [
            ("placeId", &payload.place_id),
            ("reviewId", &payload.review_id),
            ("replyText", &payload.reply_text),
        ] {
            if value.trim().is_empty() {
                return Err(QueueError::InvalidPayload(format!("{} is required", field)));
            }
        }

        let estimated = estimate_duration(payload.review_date, Utc::now().date_naive());
        let job = Job::new(payload, estimated, Instant::now());
        let id = job.id;

        {
            let mut state = self.state.lock();
            if state.active.len() >= self.config.capacity {
                warn!("Reply queue full, rejecting job for {}", job.target);
                return Err(QueueError::QueueFull(state.active.len()));
            }
            info!(
                "Reply job {} queued for {} (estimated {:?})",
                id, job.target, estimated
            );
            state.jobs.insert(id, job);
            state.active.push_back(id);
            state.recompute_positions();
        }

        self.notify.notify_one();
        Ok(id)
    }

    /// 查询任务状态，同时刷新任务的最近轮询时间
    pub fn poll(&self, id: Uuid) -> Option<JobStatusDocument> {
        let mut state = self.state.lock();
        let job = state.jobs.get_mut(&id)?;
        job.last_polled = Instant::now();
        Some(job.status_document())
    }

    /// 取出下一个要执行的任务
    ///
    /// 已有任务在执行时返回 `None`。开始之前会检查存活：超过存活时限
    /// 未被轮询的任务直接标记为失败并跳过。
    pub fn next_job(&self) -> Option<Job> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.current.is_some() {
            return None;
        }

        let now = Instant::now();
        while let Some(&id) = state.active.front() {
            let abandoned = match state.jobs.get(&id) {
                Some(job) => job.is_abandoned(now, self.config.liveness_timeout),
                None => {
                    state.active.pop_front();
                    continue;
                }
            };

            if abandoned {
                info!("Reply job {} abandoned by its client, skipping", id);
                state.finish(id, JobStatus::Failed, Some(CLIENT_DISCONNECTED.to_string()));
                if let Some(job) = state.jobs.get_mut(&id) {
                    job.cancelled = true;
                }
                continue;
            }

            state.current = Some(id);
            let job = state.jobs.get_mut(&id)?;
            job.status = JobStatus::Processing;
            job.started_at = Some(Utc::now());
            let started = job.clone();
            state.recompute_positions();
            return Some(started);
        }

        None
    }

    /// 标记任务成功
    pub fn complete(&self, id: Uuid) {
        if self.state.lock().finish(id, JobStatus::Completed, None) {
            info!("Reply job {} completed", id);
        }
    }

    /// 标记任务失败
    pub fn fail(&self, id: Uuid, error: impl Into<String>) {
        let error = error.into();
        if self.state.lock().finish(id, JobStatus::Failed, Some(error.clone())) {
            warn!("Reply job {} failed: {}", id, error);
        }
    }

    /// 清理长时间未轮询的排队任务和过期的终止任务，返回移除数量
    pub fn sweep(&self) -> usize {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = Instant::now();
        let current = state.current;

        let expired: Vec<Uuid> = state
            .jobs
            .values()
            .filter(|job| match job.status {
                JobStatus::Queued => {
                    Some(job.id) != current && job.is_abandoned(now, self.config.stale_queued_timeout)
                }
                JobStatus::Processing => false,
                JobStatus::Completed | JobStatus::Failed => job
                    .finished
                    .is_some_and(|t| now.saturating_duration_since(t) > self.config.retention),
            })
            .map(|job| job.id)
            .collect();

        if expired.is_empty() {
            return 0;
        }

        for id in &expired {
            state.jobs.remove(id);
        }
        state.active.retain(|id| !expired.contains(id));
        state.recompute_positions();
        debug!("Swept {} reply jobs", expired.len());
        expired.len()
    }

    /// 等待新任务提交
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    /// 活跃任务数（排队和执行中）
    pub fn depth(&self) -> usize {
        self.state.lock().active.len()
    }

    /// 仍保留在内存中的任务总数
    pub fn len(&self) -> usize {
        self.state.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().jobs.is_empty()
    }

    pub fn current(&self) -> Option<Uuid> {
        self.state.lock().current
    }
}

#[cfg(test)]
#[path = "reply_queue_test.rs"]
mod tests;
