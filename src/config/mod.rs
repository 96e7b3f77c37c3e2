// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 分层加载服务器、代理池、抓取、收集、队列和自动化配置
pub mod settings;

pub use settings::Settings;
