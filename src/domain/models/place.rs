// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 搜索命中结果
///
/// 各抓取层的原始结构都会被规范化为此结构。计数字段在规范化时已从
/// 本地化字符串解析为非负整数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    /// 外部服务中的地点标识
    pub id: String,
    /// 显示名称
    pub name: String,
    /// 分类
    pub category: Option<String>,
    /// 排名（从 1 开始）
    pub rank: u32,
    /// 访客评论数
    pub visitor_review_count: u64,
    /// 博客评论数
    pub blog_review_count: u64,
    /// 评分，0 或空值规范化为缺失
    pub rating: Option<f32>,
    /// 是否为查询目标
    pub is_target: bool,
}

/// 搜索查询
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// 关键词
    pub keyword: String,
    /// 需要标记的目标地点
    #[serde(default)]
    pub target_id: Option<String>,
    /// 经度
    #[serde(default)]
    pub longitude: Option<f64>,
    /// 纬度
    #[serde(default)]
    pub latitude: Option<f64>,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            target_id: None,
            longitude: None,
            latitude: None,
        }
    }

    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    /// 判断结果是否为目标
    pub fn is_target(&self, id: &str) -> bool {
        self.target_id.as_deref() == Some(id)
    }
}

/// 搜索约束
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConstraints {
    /// 期望的结果数量
    pub limit: usize,
    /// 每页大小（会被外部服务的硬上限截断）
    pub page_size: usize,
    /// 最大页数
    pub max_pages: u32,
}

impl Default for SearchConstraints {
    fn default() -> Self {
        Self {
            limit: 100,
            page_size: 50,
            max_pages: 5,
        }
    }
}

/// 排名查询结果
///
/// 目标不在结果中不是错误，而是正常的 `NotFound`
#[derive(Debug, Clone, PartialEq)]
pub enum RankLookup {
    /// 找到目标
    Found(FetchResult),
    /// 未找到目标
    NotFound {
        /// 已扫描的结果数
        scanned: usize,
    },
}

impl RankLookup {
    /// 从结果列表中定位目标
    pub fn from_results(results: &[FetchResult]) -> Self {
        match results.iter().find(|r| r.is_target) {
            Some(hit) => RankLookup::Found(hit.clone()),
            None => RankLookup::NotFound {
                scanned: results.len(),
            },
        }
    }

    pub fn rank(&self) -> Option<u32> {
        match self {
            RankLookup::Found(hit) => Some(hit.rank),
            RankLookup::NotFound { .. } => None,
        }
    }
}

/// 关键词排名报告
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankReport {
    /// 关键词
    pub keyword: String,
    /// 排名，未找到时为空
    pub rank: Option<u32>,
    /// 目标命中详情
    pub hit: Option<FetchResult>,
    /// 已扫描的结果数
    pub scanned: usize,
    /// 所有抓取层都失败时的错误
    pub error: Option<String>,
}
