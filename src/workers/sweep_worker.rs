// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::queue::ReplyQueue;
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// 任务清理工作器
///
/// 定期移除长时间未轮询的排队任务和过期的终止任务
pub struct SweepWorker {
    queue: Arc<ReplyQueue>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl SweepWorker {
    pub fn new(queue: Arc<ReplyQueue>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            queue,
            interval: Duration::from_secs(10),
            shutdown,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[async_trait]
impl Worker for SweepWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        info!("Reply sweep worker started, interval {:?}", self.interval);

        let mut interval = tokio::time::interval(self.interval);
        let mut shutdown = self.shutdown.clone();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = self.queue.sweep();
                    if removed > 0 {
                        info!("Swept {} reply jobs", removed);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        return Err(WorkerError::ShutdownChannelClosed);
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Reply sweep worker stopped");
        Ok(())
    }

    fn name(&self) -> &str {
        "sweep_worker"
    }
}
