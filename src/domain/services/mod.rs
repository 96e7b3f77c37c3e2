// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// - 排名服务（rank_service）：以有限并发批量查询关键词排名
/// - 回复自动化（reply_automation）：写回操作的外部执行能力
/// - 评论收集（review_collector）：基于游标的分页收集与提前终止
pub mod rank_service;
pub mod reply_automation;
pub mod review_collector;
