// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Extension, Json};
use std::sync::Arc;

use crate::{
    application::dto::proxy_status::ProxyStatusDto,
    infrastructure::proxy::{ProxyHealthReport, ProxyPool, ProxyProbe},
};

/// 代理池状态
pub async fn list_proxies(Extension(pool): Extension<Arc<ProxyPool>>) -> Json<Vec<ProxyStatusDto>> {
    Json(pool.snapshot().into_iter().map(ProxyStatusDto::from).collect())
}

/// 探测所有代理
pub async fn check_proxies(
    Extension(pool): Extension<Arc<ProxyPool>>,
    Extension(probe): Extension<Arc<dyn ProxyProbe>>,
) -> Json<Vec<ProxyHealthReport>> {
    Json(pool.test_all(probe.as_ref()).await)
}

/// 重新启用所有代理
pub async fn reset_proxies(Extension(pool): Extension<Arc<ProxyPool>>) -> Json<Vec<ProxyStatusDto>> {
    pool.reset_all();
    Json(pool.snapshot().into_iter().map(ProxyStatusDto::from).collect())
}
