// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// 评论收集请求
///
/// 给出 `startDate` 和 `endDate` 时按窗口收集，否则按 `count` 收集最新评论
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_range"))]
pub struct CollectRequestDto {
    #[validate(length(min = 1, message = "Place id cannot be empty"))]
    pub place_id: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 1000))]
    pub count: Option<usize>,
}

/// 收集方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectMode {
    Window { start: NaiveDate, end: NaiveDate },
    Latest(usize),
}

impl CollectRequestDto {
    pub fn mode(&self) -> CollectMode {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => CollectMode::Window { start, end },
            _ => CollectMode::Latest(self.count.unwrap_or(20)),
        }
    }
}

fn validate_range(request: &CollectRequestDto) -> Result<(), ValidationError> {
    match (request.start_date, request.end_date) {
        (Some(start), Some(end)) if start > end => {
            Err(ValidationError::new("start_date must not be after end_date"))
        }
        (Some(_), None) | (None, Some(_)) => Err(ValidationError::new(
            "start_date and end_date must be given together",
        )),
        _ => Ok(()),
    }
}
