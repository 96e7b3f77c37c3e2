// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::place::SearchConstraints;
use crate::domain::models::review::WindowScaling;
use crate::infrastructure::proxy::ProxyPoolConfig;
use crate::queue::ReplyQueueConfig;
use crate::utils::retry_policy::RetryPolicy;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
    /// 代理池配置
    pub proxy: ProxySettings,
    /// 抓取配置
    pub acquisition: AcquisitionSettings,
    /// 评论收集配置
    pub collector: CollectorSettings,
    /// 回复队列配置
    pub queue: QueueSettings,
    /// 浏览器自动化配置
    pub automation: AutomationSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
    /// 是否输出 JSON 日志
    pub json_logs: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// Prometheus 导出地址
    pub address: String,
}

/// 代理池配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ProxySettings {
    /// 出口代理列表，为空时直连
    pub urls: Vec<String>,
    pub max_failures: u32,
    pub cooldown_ms: u64,
    pub recency_window_ms: u64,
    pub recent_success_bonus: f64,
    pub min_weight: f64,
    /// 健康探测地址
    pub probe_url: String,
    pub probe_timeout_ms: u64,
}

impl ProxySettings {
    pub fn pool_config(&self) -> ProxyPoolConfig {
        ProxyPoolConfig {
            max_failures: self.max_failures,
            cooldown: Duration::from_millis(self.cooldown_ms),
            recency_window: Duration::from_millis(self.recency_window_ms),
            recent_success_bonus: self.recent_success_bonus,
            min_weight: self.min_weight,
        }
    }
}

/// 抓取配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct AcquisitionSettings {
    /// 结构化查询接口地址
    pub api_url: String,
    /// 结构化查询的来源页
    pub api_referer: String,
    /// 页面渲染地址
    pub markup_url: String,
    /// 浏览器渲染的搜索页地址，`{query}` 会被替换
    pub render_url: String,
    /// 是否启用浏览器渲染层
    pub enable_render_tier: bool,
    /// 两次外部请求之间的最小间隔
    pub min_request_delay_ms: u64,
    pub page_size: usize,
    pub max_pages: u32,
    pub limit: usize,
    pub request_timeout_ms: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    /// 批量排名查询的并发上限
    pub batch_concurrency: usize,
}

impl AcquisitionSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_backoff(
            self.max_retries,
            Duration::from_millis(self.initial_backoff_ms),
        )
    }

    pub fn constraints(&self) -> SearchConstraints {
        SearchConstraints {
            limit: self.limit,
            page_size: self.page_size,
            max_pages: self.max_pages,
        }
    }
}

/// 评论收集配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorSettings {
    pub base_target: usize,
    pub base_max_pages: u32,
    pub days_per_unit: u32,
    pub max_target: usize,
    pub max_pages_cap: u32,
    pub page_size: usize,
}

impl CollectorSettings {
    pub fn scaling(&self) -> WindowScaling {
        WindowScaling {
            base_target: self.base_target,
            base_max_pages: self.base_max_pages,
            days_per_unit: self.days_per_unit,
            max_target: self.max_target,
            max_pages_cap: self.max_pages_cap,
        }
    }
}

/// 回复队列配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct QueueSettings {
    pub liveness_timeout_s: u64,
    pub stale_queued_timeout_s: u64,
    pub retention_s: u64,
    pub sweep_interval_s: u64,
    pub inter_job_pause_ms: u64,
    pub capacity: usize,
}

impl QueueSettings {
    /// 校验时间参数
    ///
    /// 清理超时必须短于存活超时，未轮询的排队任务才会先被清理移除
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep_interval_s == 0 {
            return Err(ConfigError::Message(
                "queue.sweep_interval_s must be greater than 0".to_string(),
            ));
        }
        if self.stale_queued_timeout_s == 0 || self.stale_queued_timeout_s >= self.liveness_timeout_s {
            return Err(ConfigError::Message(format!(
                "queue.stale_queued_timeout_s ({}) must be between 1 and queue.liveness_timeout_s ({})",
                self.stale_queued_timeout_s, self.liveness_timeout_s
            )));
        }
        Ok(())
    }

    pub fn queue_config(&self) -> Result<ReplyQueueConfig, ConfigError> {
        self.validate()?;
        Ok(ReplyQueueConfig {
            liveness_timeout: Duration::from_secs(self.liveness_timeout_s),
            stale_queued_timeout: Duration::from_secs(self.stale_queued_timeout_s),
            retention: Duration::from_secs(self.retention_s),
            capacity: self.capacity,
        })
    }
}

/// 浏览器自动化配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct AutomationSettings {
    /// 远程 Chrome 调试地址，未设置时本地启动
    pub remote_debugging_url: Option<String>,
    /// 评论管理页地址，`{place_id}` 会被替换
    pub reviews_url: String,
    /// 登录页地址片段
    pub login_marker: String,
    pub navigation_timeout_s: u64,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 和 `PLACEWATCH__` 前缀的环境变量
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("PLACEWATCH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("proxy.urls")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?
            .validated()
    }

    /// 校验跨字段约束
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.queue.validate()?;
        Ok(self)
    }

    /// 内置默认值
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.json_logs", false)?
            .set_default("metrics.address", "0.0.0.0:9000")?
            // Proxy pool
            .set_default("proxy.urls", Vec::<String>::new())?
            .set_default("proxy.max_failures", 3)?
            .set_default("proxy.cooldown_ms", 5000)?
            .set_default("proxy.recency_window_ms", 300_000)?
            .set_default("proxy.recent_success_bonus", 0.2)?
            .set_default("proxy.min_weight", 0.05)?
            .set_default("proxy.probe_url", "https://www.google.com/generate_204")?
            .set_default("proxy.probe_timeout_ms", 5000)?
            // Acquisition
            .set_default("acquisition.api_url", "https://pcmap-api.place.naver.com/graphql")?
            .set_default("acquisition.api_referer", "https://m.place.naver.com/")?
            .set_default("acquisition.markup_url", "https://m.place.naver.com")?
            .set_default(
                "acquisition.render_url",
                "https://map.naver.com/p/search/{query}",
            )?
            .set_default("acquisition.enable_render_tier", false)?
            .set_default("acquisition.min_request_delay_ms", 1000)?
            .set_default("acquisition.page_size", 50)?
            .set_default("acquisition.max_pages", 5)?
            .set_default("acquisition.limit", 100)?
            .set_default("acquisition.request_timeout_ms", 15_000)?
            .set_default("acquisition.max_retries", 2)?
            .set_default("acquisition.initial_backoff_ms", 1000)?
            .set_default("acquisition.batch_concurrency", 3)?
            // Collector
            .set_default("collector.base_target", 50)?
            .set_default("collector.base_max_pages", 5)?
            .set_default("collector.days_per_unit", 30)?
            .set_default("collector.max_target", 1000)?
            .set_default("collector.max_pages_cap", 100)?
            .set_default("collector.page_size", 20)?
            // Reply queue
            .set_default("queue.liveness_timeout_s", 60)?
            .set_default("queue.stale_queued_timeout_s", 30)?
            .set_default("queue.retention_s", 600)?
            .set_default("queue.sweep_interval_s", 10)?
            .set_default("queue.inter_job_pause_ms", 2000)?
            .set_default("queue.capacity", 100)?
            // Automation
            .set_default(
                "automation.reviews_url",
                "https://new.smartplace.naver.com/bizes/place/{place_id}/reviews",
            )?
            .set_default("automation.login_marker", "nid.naver.com")?
            .set_default("automation.navigation_timeout_s", 120)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
