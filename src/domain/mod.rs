// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：代理、搜索结果、评论和回复任务
/// - 服务（services）：评论收集、排名查询和回复自动化接口
///
/// 领域层不依赖具体的网络或浏览器实现。
pub mod models;
pub mod services;
