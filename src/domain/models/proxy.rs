// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use tokio::time::Instant;

/// 响应时间滑动平均的平滑因子
const RESPONSE_TIME_ALPHA: f64 = 0.1;

/// 代理记录
///
/// 记录一个出口代理的健康状况。记录只会被停用，不会被删除。
#[derive(Debug, Clone)]
pub struct ProxyRecord {
    /// 出口标识（代理 URL）
    pub egress: String,
    /// 累计成功次数
    pub success_count: u64,
    /// 当前失败计数（成功时递减）
    pub failure_count: u32,
    /// 最近一次被选中的时间
    pub last_used: Option<Instant>,
    /// 最近一次成功的时间
    pub last_success: Option<Instant>,
    /// 是否可用
    pub active: bool,
    /// 平均响应时间
    pub avg_response_time: Option<Duration>,
    /// 最近一次错误
    pub last_error: Option<String>,
}

impl ProxyRecord {
    pub fn new(egress: impl Into<String>) -> Self {
        Self {
            egress: egress.into(),
            success_count: 0,
            failure_count: 0,
            last_used: None,
            last_success: None,
            active: true,
            avg_response_time: None,
            last_error: None,
        }
    }

    /// 成功率，从未使用过的代理视为 1.0
    pub fn success_rate(&self) -> f64 {
        let total = self.success_count + u64::from(self.failure_count);
        if total == 0 {
            1.0
        } else {
            self.success_count as f64 / total as f64
        }
    }

    /// 是否可被选择
    pub fn is_selectable(&self, max_failures: u32) -> bool {
        self.active && self.failure_count < max_failures
    }

    /// 冷却时间是否已过
    pub fn is_cooled_down(&self, now: Instant, cooldown: Duration) -> bool {
        match self.last_used {
            Some(used) => now.saturating_duration_since(used) >= cooldown,
            None => true,
        }
    }

    /// 记录一次成功
    ///
    /// 失败计数递减（最低为 0），若因此回到阈值以下则重新激活
    pub fn record_success(&mut self, response_time: Duration, now: Instant, max_failures: u32) {
        self.success_count += 1;
        self.failure_count = self.failure_count.saturating_sub(1);
        self.last_success = Some(now);
        self.avg_response_time = Some(match self.avg_response_time {
            None => response_time,
            Some(avg) => {
                let blended = avg.as_secs_f64() * (1.0 - RESPONSE_TIME_ALPHA)
                    + response_time.as_secs_f64() * RESPONSE_TIME_ALPHA;
                Duration::from_secs_f64(blended)
            }
        });
        if !self.active && self.failure_count < max_failures {
            self.active = true;
        }
    }

    /// 记录一次失败
    ///
    /// # 返回值
    ///
    /// 本次失败导致代理被停用时返回 true
    pub fn record_failure(&mut self, error: &str, max_failures: u32) -> bool {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_error = Some(error.to_string());
        if self.active && self.failure_count >= max_failures {
            self.active = false;
            return true;
        }
        false
    }

    /// 重置为初始健康状态
    pub fn reset(&mut self) {
        self.failure_count = 0;
        self.active = true;
        self.last_error = None;
    }
}
