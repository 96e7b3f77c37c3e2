// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
///
/// 启动后台工作器，并通过共享的关闭信号统一停止它们
pub struct WorkerManager {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<(String, JoinHandle<Result<(), WorkerError>>)>,
}

impl Default for WorkerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    /// 工作器使用的关闭信号
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// 启动工作器
    pub fn spawn(&mut self, worker: Arc<dyn Worker>) {
        let name = worker.name().to_string();
        info!("Starting worker {}", name);
        let handle = tokio::spawn(async move { worker.run().await });
        self.handles.push((name, handle));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// 等待关闭信号并关闭工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
        self.shutdown().await;
    }

    /// 通知所有工作器停止，并等待它们结束
    ///
    /// 正在执行的任务会先完成
    pub async fn shutdown(&mut self) {
        info!("Shutting down workers...");
        let _ = self.shutdown_tx.send(true);

        for (name, handle) in self.handles.drain(..) {
            match handle.await {
                Ok(Ok(())) => info!("Worker {} stopped", name),
                Ok(Err(e)) => error!("Worker {} exited with error: {}", name, e),
                Err(e) => error!("Worker {} panicked: {}", name, e),
            }
        }

        info!("Workers shut down successfully");
    }
}
