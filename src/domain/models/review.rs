// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 访客评论
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    /// 评论唯一标识
    pub id: String,
    /// 作者昵称
    pub author: Option<String>,
    /// 正文
    pub body: String,
    /// 评分
    pub rating: Option<f32>,
    /// 原始日期字符串（相对/月日/完整格式）
    pub raw_date: String,
    /// 解析后的日期，由收集器填充
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// 是否已有商家回复
    #[serde(default)]
    pub has_reply: bool,
}

/// 一页评论
#[derive(Debug, Clone, Default)]
pub struct ReviewPage {
    /// 评论列表
    pub items: Vec<ReviewItem>,
    /// 下一页游标，为空表示没有更多
    pub cursor: Option<String>,
}

/// 评论分页请求
#[derive(Debug, Clone)]
pub struct ReviewPageRequest {
    /// 地点标识
    pub place_id: String,
    /// 上一页返回的游标
    pub after: Option<String>,
    /// 每页大小
    pub page_size: usize,
}

/// 时间窗口缩放参数
///
/// 窗口越宽，允许的页数和目标数量越多
#[derive(Debug, Clone, Copy)]
pub struct WindowScaling {
    /// 每个单位的基础目标数量
    pub base_target: usize,
    /// 每个单位的基础页数
    pub base_max_pages: u32,
    /// 一个单位包含的天数
    pub days_per_unit: u32,
    /// 目标数量上限
    pub max_target: usize,
    /// 页数上限
    pub max_pages_cap: u32,
}

impl Default for WindowScaling {
    fn default() -> Self {
        Self {
            base_target: 50,
            base_max_pages: 5,
            days_per_unit: 30,
            max_target: 1000,
            max_pages_cap: 100,
        }
    }
}

/// 收集时间窗口
///
/// 请求日期落在 `[start, end]` 内的条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionWindow {
    /// 起始日期（含）
    pub start: NaiveDate,
    /// 结束日期（含）
    pub end: NaiveDate,
    /// 目标条目数
    pub target_count: usize,
    /// 最大页数
    pub max_pages: u32,
}

impl CollectionWindow {
    /// 按窗口长度缩放目标数量和页数
    pub fn scaled(start: NaiveDate, end: NaiveDate, scaling: &WindowScaling) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let days = (end - start).num_days() as u64 + 1;
        let per_unit = u64::from(scaling.days_per_unit.max(1));
        let units = days.div_ceil(per_unit).max(1);

        let target_count = (scaling.base_target as u64 * units).min(scaling.max_target as u64);
        let max_pages = (u64::from(scaling.base_max_pages) * units).min(u64::from(scaling.max_pages_cap));

        Self {
            start,
            end,
            target_count: target_count as usize,
            max_pages: max_pages as u32,
        }
    }

    /// 使用显式预算创建窗口
    pub fn with_budget(start: NaiveDate, end: NaiveDate, target_count: usize, max_pages: u32) -> Self {
        Self {
            start,
            end,
            target_count,
            max_pages,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// 一次收集请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionRequest {
    /// 按日期窗口收集
    Window(CollectionWindow),
    /// 只按数量收集最新条目，不做日期判断
    Count { target_count: usize, max_pages: u32 },
}

impl CollectionRequest {
    pub fn target_count(&self) -> usize {
        match self {
            CollectionRequest::Window(window) => window.target_count,
            CollectionRequest::Count { target_count, .. } => *target_count,
        }
    }

    pub fn max_pages(&self) -> u32 {
        match self {
            CollectionRequest::Window(window) => window.max_pages,
            CollectionRequest::Count { max_pages, .. } => *max_pages,
        }
    }
}
