// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::proxy::ProxyRecord;
use serde::Serialize;

/// 代理状态
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyStatusDto {
    pub egress: String,
    pub success_count: u64,
    pub failure_count: u32,
    pub success_rate: f64,
    pub active: bool,
    pub avg_response_time_ms: Option<u64>,
    pub last_error: Option<String>,
}

impl From<ProxyRecord> for ProxyStatusDto {
    fn from(record: ProxyRecord) -> Self {
        Self {
            success_rate: record.success_rate(),
            avg_response_time_ms: record.avg_response_time.map(|d| d.as_millis() as u64),
            egress: record.egress,
            success_count: record.success_count,
            failure_count: record.failure_count,
            active: record.active,
            last_error: record.last_error,
        }
    }
}
