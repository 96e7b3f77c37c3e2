// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// 代理探测特质
///
/// `ProxyPool::test_all` 通过它逐个检查出口是否可用
#[async_trait]
pub trait ProxyProbe: Send + Sync {
    /// 探测一个出口，成功时返回响应时间
    async fn probe(&self, egress: &str) -> Result<Duration, String>;
}

/// 基于 HTTP 请求的代理探测
pub struct HttpProxyProbe {
    probe_url: String,
    timeout: Duration,
}

impl HttpProxyProbe {
    pub fn new(probe_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            probe_url: probe_url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ProxyProbe for HttpProxyProbe {
    async fn probe(&self, egress: &str) -> Result<Duration, String> {
        let proxy = reqwest::Proxy::all(egress).map_err(|e| format!("Invalid proxy: {}", e))?;
        let client = reqwest::Client::builder()
            .proxy(proxy)
            .timeout(self.timeout)
            .build()
            .map_err(|e| e.to_string())?;

        let start = Instant::now();
        let response = client
            .get(&self.probe_url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("probe status {}", response.status()));
        }
        Ok(start.elapsed())
    }
}
