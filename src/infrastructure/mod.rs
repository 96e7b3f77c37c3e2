// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 与外部系统交互的技术实现：
/// - 自动化（automation）：基于浏览器的回复写回
/// - 浏览器（browser）：共享的 Chromium 实例
/// - 指标（metrics）：Prometheus 导出
/// - 代理（proxy）：出口代理池和健康探测
pub mod automation;
pub mod browser;
pub mod metrics;
pub mod proxy;
