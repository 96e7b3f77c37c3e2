// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::place::{SearchConstraints, SearchQuery};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequestDto {
    #[validate(length(min = 1, message = "Keyword cannot be empty"))]
    pub keyword: String,
    /// 需要标记的目标地点
    pub target_id: Option<String>,
    #[validate(range(min = 1, max = 300))]
    pub limit: Option<usize>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl SearchRequestDto {
    pub fn query(&self) -> SearchQuery {
        let mut query = SearchQuery::new(self.keyword.trim());
        query.longitude = self.longitude;
        query.latitude = self.latitude;
        match &self.target_id {
            Some(target) => query.with_target(target.clone()),
            None => query,
        }
    }

    /// 在默认约束上应用请求中的数量
    pub fn constraints(&self, defaults: SearchConstraints) -> SearchConstraints {
        SearchConstraints {
            limit: self.limit.unwrap_or(defaults.limit),
            ..defaults
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RankRequestDto {
    #[validate(length(min = 1, message = "Target id cannot be empty"))]
    pub target_id: String,
    #[validate(length(min = 1, max = 50, message = "Between 1 and 50 keywords required"))]
    pub keywords: Vec<String>,
}
