// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Extension, Json};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::{
    application::dto::search_request::{RankRequestDto, SearchRequestDto},
    domain::models::place::{FetchResult, RankReport, SearchConstraints},
    domain::services::rank_service::RankService,
    engines::AcquisitionClient,
    presentation::errors::AppError,
};

/// 搜索地点
pub async fn search(
    Extension(client): Extension<Arc<AcquisitionClient>>,
    Extension(defaults): Extension<SearchConstraints>,
    Json(request): Json<SearchRequestDto>,
) -> Result<Json<Vec<FetchResult>>, AppError> {
    request.validate()?;

    let results = client
        .fetch(&request.query(), &request.constraints(defaults))
        .await?;
    info!(
        "Search '{}' returned {} results",
        request.keyword,
        results.len()
    );
    Ok(Json(results))
}

/// 批量查询排名
pub async fn check_ranks(
    Extension(ranks): Extension<Arc<RankService>>,
    Json(request): Json<RankRequestDto>,
) -> Result<Json<Vec<RankReport>>, AppError> {
    request.validate()?;

    let keywords: Vec<String> = request
        .keywords
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    Ok(Json(ranks.check_ranks(&request.target_id, &keywords).await))
}
