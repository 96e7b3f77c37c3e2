// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::proxy::ProxyRecord;
use crate::infrastructure::proxy::probe::ProxyProbe;
use futures::future::join_all;
use metrics::counter;
use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// 代理池配置
#[derive(Debug, Clone)]
pub struct ProxyPoolConfig {
    /// 失败次数达到此值即停用
    pub max_failures: u32,
    /// 两次使用之间的最短空闲时间
    pub cooldown: Duration,
    /// 最近成功加成的时间窗口
    pub recency_window: Duration,
    /// 最近成功加成
    pub recent_success_bonus: f64,
    /// 权重下限，保证活跃代理不会被永久饿死
    pub min_weight: f64,
}

impl Default for ProxyPoolConfig {
    fn default() -> Self {
        Self {
            max_failures: 3,
            cooldown: Duration::from_millis(5000),
            recency_window: Duration::from_millis(300_000),
            recent_success_bonus: 0.2,
            min_weight: 0.05,
        }
    }
}

/// 单个代理的探测结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyHealthReport {
    pub egress: String,
    pub healthy: bool,
    pub response_time_ms: Option<u64>,
    pub error: Option<String>,
    /// 探测结果写回后代理是否处于可用状态
    pub active: bool,
}

/// 代理池
///
/// 所有选择和状态更新都在同一把锁下完成，多个并发抓取可以安全地
/// 同时获取和回报代理。空池是合法的，此时 `acquire` 返回 `None` 表示直连。
pub struct ProxyPool {
    records: Mutex<Vec<ProxyRecord>>,
    config: ProxyPoolConfig,
}

impl ProxyPool {
    pub fn new<I, S>(urls: I, config: ProxyPoolConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records: Vec<ProxyRecord> = urls.into_iter().map(ProxyRecord::new).collect();
        info!("Proxy pool initialized with {} egress points", records.len());
        Self {
            records: Mutex::new(records),
            config,
        }
    }

    pub fn config(&self) -> &ProxyPoolConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// 当前可被选择的代理数量
    pub fn active_count(&self) -> usize {
        let max_failures = self.config.max_failures;
        self.records
            .lock()
            .iter()
            .filter(|r| r.is_selectable(max_failures))
            .count()
    }

    /// 获取一个出口
    ///
    /// 优先选择已过冷却期的代理；如果都在冷却中则放宽为所有可用代理。
    /// 在候选集中按权重随机抽取。
    pub fn acquire(&self) -> Option<String> {
        let mut records = self.records.lock();
        let now = Instant::now();
        let max_failures = self.config.max_failures;

        let selectable: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_selectable(max_failures))
            .map(|(i, _)| i)
            .collect();

        if selectable.is_empty() {
            if !records.is_empty() {
                warn!("No active proxies left in pool of {}", records.len());
            }
            return None;
        }

        let cooled: Vec<usize> = selectable
            .iter()
            .copied()
            .filter(|&i| records[i].is_cooled_down(now, self.config.cooldown))
            .collect();
        let candidates = if cooled.is_empty() {
            debug!("All proxies cooling down, relaxing cooldown filter");
            selectable
        } else {
            cooled
        };

        let weights: Vec<f64> = candidates
            .iter()
            .map(|&i| self.weight(&records[i], now))
            .collect();
        let total: f64 = weights.iter().sum();
        let draw = rand::random::<f64>() * total;
        let chosen = candidates[weighted_index(&weights, draw)];

        let record = &mut records[chosen];
        record.last_used = Some(now);
        counter!("proxy_acquire_total").increment(1);
        Some(record.egress.clone())
    }

    /// 回报一次成功
    pub fn report_success(&self, egress: &str, response_time: Duration) {
        let mut records = self.records.lock();
        let Some(record) = records.iter_mut().find(|r| r.egress == egress) else {
            return;
        };
        let was_active = record.active;
        record.record_success(response_time, Instant::now(), self.config.max_failures);
        if !was_active && record.active {
            info!("Proxy {} recovered after successful request", egress);
        }
    }

    /// 回报一次失败
    pub fn report_failure(&self, egress: &str, error: &str) {
        let mut records = self.records.lock();
        let Some(record) = records.iter_mut().find(|r| r.egress == egress) else {
            return;
        };
        if record.record_failure(error, self.config.max_failures) {
            warn!(
                "Proxy {} deactivated after {} failures, last error: {}",
                egress, record.failure_count, error
            );
            counter!("proxy_deactivated_total").increment(1);
        } else {
            debug!(
                "Proxy {} failure {}/{}: {}",
                egress, record.failure_count, self.config.max_failures, error
            );
        }
    }

    /// 重置单个代理，不存在时返回 false
    pub fn reset(&self, egress: &str) -> bool {
        let mut records = self.records.lock();
        match records.iter_mut().find(|r| r.egress == egress) {
            Some(record) => {
                record.reset();
                true
            }
            None => false,
        }
    }

    pub fn reset_all(&self) {
        for record in self.records.lock().iter_mut() {
            record.reset();
        }
    }

    /// 当前所有代理记录的副本
    pub fn snapshot(&self) -> Vec<ProxyRecord> {
        self.records.lock().clone()
    }

    /// 并发探测所有代理并把结果写回池中
    pub async fn test_all(&self, probe: &dyn ProxyProbe) -> Vec<ProxyHealthReport> {
        let egresses: Vec<String> = self.snapshot().into_iter().map(|r| r.egress).collect();
        let outcomes = join_all(egresses.iter().map(|egress| probe.probe(egress))).await;

        let mut reports = Vec::with_capacity(egresses.len());
        for (egress, outcome) in egresses.into_iter().zip(outcomes) {
            let (healthy, response_time_ms, error) = match outcome {
                Ok(elapsed) => {
                    self.report_success(&egress, elapsed);
                    (true, Some(elapsed.as_millis() as u64), None)
                }
                Err(e) => {
                    self.report_failure(&egress, &e);
                    (false, None, Some(e))
                }
            };
            let active = self
                .records
                .lock()
                .iter()
                .find(|r| r.egress == egress)
                .is_some_and(|r| r.is_selectable(self.config.max_failures));
            reports.push(ProxyHealthReport {
                egress,
                healthy,
                response_time_ms,
                error,
                active,
            });
        }

        info!(
            "Proxy test finished: {}/{} healthy",
            reports.iter().filter(|r| r.healthy).count(),
            reports.len()
        );
        reports
    }

    fn weight(&self, record: &ProxyRecord, now: Instant) -> f64 {
        let recent = record
            .last_success
            .is_some_and(|t| now.saturating_duration_since(t) <= self.config.recency_window);
        let bonus = if recent {
            self.config.recent_success_bonus
        } else {
            0.0
        };
        (record.success_rate() + bonus).max(self.config.min_weight)
    }
}

/// 按累计权重定位抽中的下标，`draw` 取值于 `[0, sum(weights))`
fn weighted_index(weights: &[f64], draw: f64) -> usize {
    let mut cumulative = 0.0;
    for (i, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if draw < cumulative {
            return i;
        }
    }
    weights.len().saturating_sub(1)
}
