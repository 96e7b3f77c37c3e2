// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// 会话存活标记，事件循环结束时置为 false
#[derive(Clone, Debug)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn mark_dead(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 可重建的共享会话
///
/// 保存当前会话及其存活标记。会话失效（事件循环退出或被调用方作废）后，
/// 下一次获取时重新建立。
pub struct SessionSlot<T> {
    current: Mutex<Option<(Arc<T>, Liveness)>>,
}

impl<T> Default for SessionSlot<T> {
    fn default() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }
}

impl<T> SessionSlot<T> {
    /// 返回存活的会话，不存在或已失效时调用 `launch` 重建
    pub async fn get_or_launch<F, Fut>(&self, launch: F) -> Result<Arc<T>, String>
    where
        F: FnOnce(Liveness) -> Fut,
        Fut: Future<Output = Result<T, String>>,
    {
        let mut current = self.current.lock().await;
        if let Some((session, liveness)) = current.as_ref() {
            if liveness.is_alive() {
                return Ok(session.clone());
            }
            warn!("Browser session is gone, relaunching");
            *current = None;
        }

        let liveness = Liveness::new();
        let session = Arc::new(launch(liveness.clone()).await?);
        *current = Some((session.clone(), liveness));
        Ok(session)
    }

    /// 作废当前会话
    pub async fn invalidate(&self) {
        if let Some((_, liveness)) = self.current.lock().await.take() {
            liveness.mark_dead();
        }
    }

    pub async fn is_active(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(|(_, liveness)| liveness.is_alive())
    }
}

/// 浏览器启动器
///
/// 第一次使用时启动（或连接远程）Chromium，之后复用同一实例。
/// Chromium 崩溃或远程连接断开后会重新启动。由渲染抓取层和回复自动化共享。
pub struct BrowserLauncher {
    slot: SessionSlot<Browser>,
    remote_debugging_url: Option<String>,
    request_timeout: Duration,
}

impl BrowserLauncher {
    pub fn new(remote_debugging_url: Option<String>, request_timeout: Duration) -> Self {
        Self {
            slot: SessionSlot::default(),
            remote_debugging_url,
            request_timeout,
        }
    }

    /// 获取或初始化浏览器实例
    pub async fn browser(&self) -> Result<Arc<Browser>, String> {
        self.slot
            .get_or_launch(|liveness| self.launch(liveness))
            .await
    }

    /// 浏览器命令出现连接错误时调用，下次获取会重新启动
    pub async fn invalidate(&self) {
        self.slot.invalidate().await;
    }

    async fn launch(&self, liveness: Liveness) -> Result<Browser, String> {
        let (browser, mut handler) = if let Some(url) = &self.remote_debugging_url {
            info!("Connecting to remote Chrome instance at: {}", url);
            Browser::connect(url)
                .await
                .map_err(|e| format!("Failed to connect to remote Chrome: {}", e))?
        } else {
            let config = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(self.request_timeout)
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .build()?;
            Browser::launch(config).await.map_err(|e| e.to_string())?
        };

        // Drive browser events until the connection closes
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("Browser event loop failed: {}", e);
                    break;
                }
            }
            liveness.mark_dead();
        });

        Ok(browser)
    }
}
