// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::Job;
use crate::domain::services::reply_automation::{ReplyAutomation, ReplyOutcome};
use crate::queue::ReplyQueue;
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

/// 回复工作器
///
/// 队列的唯一消费者，一次只执行一个任务。任务之间短暂停顿，
/// 执行中的任务不会被关闭信号打断。
pub struct ReplyWorker {
    queue: Arc<ReplyQueue>,
    automation: Arc<dyn ReplyAutomation>,
    inter_job_pause: Duration,
    shutdown: watch::Receiver<bool>,
}

impl ReplyWorker {
    pub fn new(
        queue: Arc<ReplyQueue>,
        automation: Arc<dyn ReplyAutomation>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            queue,
            automation,
            inter_job_pause: Duration::from_millis(2000),
            shutdown,
        }
    }

    pub fn with_inter_job_pause(mut self, pause: Duration) -> Self {
        self.inter_job_pause = pause;
        self
    }

    /// 执行单个任务，结果只记录在任务上
    #[instrument(skip(self, job), fields(job_id = %job.id, target = %job.target))]
    async fn process(&self, job: Job) {
        match self.automation.post_reply(&job.payload).await {
            Ok(ReplyOutcome::Posted) => self.queue.complete(job.id),
            Ok(ReplyOutcome::AlreadyReplied) => {
                info!("Review already has a reply, nothing written");
                self.queue.complete(job.id);
            }
            Err(e) => self.queue.fail(job.id, e.to_string()),
        }
    }
}

#[async_trait]
impl Worker for ReplyWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        info!(
            "Reply worker started with automation '{}'",
            self.automation.name()
        );
        let mut shutdown = self.shutdown.clone();

        loop {
            if *shutdown.borrow() {
                break;
            }

            if let Some(job) = self.queue.next_job() {
                self.process(job).await;
                tokio::select! {
                    _ = tokio::time::sleep(self.inter_job_pause) => {}
                    _ = shutdown.changed() => {}
                }
                continue;
            }

            tokio::select! {
                _ = self.queue.notified() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        warn!("Shutdown channel closed, stopping reply worker");
                        return Err(WorkerError::ShutdownChannelClosed);
                    }
                }
            }
        }

        info!("Reply worker stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "reply_worker"
    }
}

#[cfg(test)]
#[path = "reply_worker_test.rs"]
mod tests;
