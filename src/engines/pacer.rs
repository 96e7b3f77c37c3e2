// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use governor::clock::Clock;
use governor::middleware::NoOpMiddleware;
use governor::nanos::Nanos;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::time::Duration;
use tokio::time::Instant;

/// 基于 `tokio::time` 的限流时钟，暂停时钟的测试中随之推进
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: Instant,
}

impl Default for TokioClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    type Instant = Nanos;

    fn now(&self) -> Nanos {
        Nanos::from(Instant::now().saturating_duration_since(self.origin))
    }
}

type PacerLimiter = RateLimiter<NotKeyed, InMemoryState, TokioClock, NoOpMiddleware<Nanos>>;

/// 请求节流器
///
/// 保证同一客户端实例的任意两次外发请求之间至少间隔 `min_delay`，
/// 与所处的抓取层无关。
pub struct RequestPacer {
    limiter: Option<PacerLimiter>,
    clock: TokioClock,
    min_delay: Duration,
}

impl RequestPacer {
    /// 创建节流器，`min_delay` 为零时不做任何等待
    pub fn new(min_delay: Duration) -> Self {
        let clock = TokioClock::default();
        let limiter =
            Quota::with_period(min_delay).map(|quota| RateLimiter::direct_with_clock(quota, clock.clone()));
        Self {
            limiter,
            clock,
            min_delay,
        }
    }

    /// 不节流
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// 等待直到允许发出下一次请求
    pub async fn wait(&self) {
        let Some(limiter) = &self.limiter else {
            return;
        };
        while let Err(not_until) = limiter.check() {
            tokio::time::sleep(not_until.wait_time_from(self.clock.now())).await;
        }
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }
}
