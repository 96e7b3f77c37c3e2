// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 初始化指标系统
///
/// 在给定地址启动 Prometheus 导出端点并注册指标描述。监听失败只记录日志。
pub fn init_metrics(address: &str) {
    let addr: SocketAddr = match address.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", address, e);
            return;
        }
    };

    // Port may already be taken during development
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!("proxy_acquire_total", "Total number of proxy acquisitions");
    describe_counter!(
        "proxy_deactivated_total",
        "Total number of proxies deactivated after repeated failures"
    );
    describe_counter!(
        "acquisition_tier_attempts_total",
        "Tier attempts by tier name and outcome"
    );
    describe_counter!("reply_jobs_total", "Reply jobs by terminal status");
    describe_gauge!(
        "reply_queue_depth",
        "Number of reply jobs waiting or in progress"
    );
}
