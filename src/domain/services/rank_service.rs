// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::place::{RankLookup, RankReport, SearchConstraints, SearchQuery};
use crate::engines::router::AcquisitionClient;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};

/// 排名服务
///
/// 批量查询多个关键词下目标地点的排名。并发数有明确上限，
/// 避免短时间内向外部服务发出过多请求。
pub struct RankService {
    client: Arc<AcquisitionClient>,
    concurrency: usize,
    constraints: SearchConstraints,
}

impl RankService {
    pub fn new(client: Arc<AcquisitionClient>, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
            constraints: SearchConstraints::default(),
        }
    }

    pub fn with_constraints(mut self, constraints: SearchConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// 查询每个关键词的排名，结果顺序与输入一致
    ///
    /// 单个关键词失败会记录在对应报告中，不影响其他关键词
    pub async fn check_ranks(&self, target_id: &str, keywords: &[String]) -> Vec<RankReport> {
        let reports: Vec<RankReport> = stream::iter(keywords.to_vec())
            .map(|keyword| async move { self.check_one(target_id, &keyword).await })
            .buffered(self.concurrency)
            .collect()
            .await;

        info!(
            "Rank check for {} finished: {}/{} keywords ranked",
            target_id,
            reports.iter().filter(|r| r.rank.is_some()).count(),
            reports.len()
        );
        reports
    }

    async fn check_one(&self, target_id: &str, keyword: &str) -> RankReport {
        let query = SearchQuery::new(keyword);
        match self
            .client
            .find_rank(&query, target_id, &self.constraints)
            .await
        {
            Ok(RankLookup::Found(hit)) => RankReport {
                keyword: keyword.to_string(),
                rank: Some(hit.rank),
                scanned: hit.rank as usize,
                hit: Some(hit),
                error: None,
            },
            Ok(RankLookup::NotFound { scanned }) => RankReport {
                keyword: keyword.to_string(),
                rank: None,
                hit: None,
                scanned,
                error: None,
            },
            Err(e) => {
                warn!("Rank check for keyword '{}' failed: {}", keyword, e);
                RankReport {
                    keyword: keyword.to_string(),
                    rank: None,
                    hit: None,
                    scanned: 0,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
