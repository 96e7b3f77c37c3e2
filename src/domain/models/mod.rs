// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 回复任务（job）：写回队列中的异步回复请求及其状态文档
/// - 地点（place）：搜索查询、约束和规范化后的命中结果
/// - 代理（proxy）：出口代理的健康记录
/// - 评论（review）：评论条目、分页和收集时间窗口
pub mod job;
pub mod place;
pub mod proxy;
pub mod review;
