// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Extension, Json};
use std::sync::Arc;
use validator::Validate;

use crate::{
    application::dto::collect_request::{CollectMode, CollectRequestDto},
    domain::services::review_collector::{Collection, ReviewCollector, ReviewFeed},
    presentation::errors::AppError,
};

/// 收集评论
pub async fn collect_reviews(
    Extension(collector): Extension<Arc<ReviewCollector<dyn ReviewFeed>>>,
    Json(request): Json<CollectRequestDto>,
) -> Result<Json<Collection>, AppError> {
    request.validate()?;

    let collection = match request.mode() {
        CollectMode::Window { start, end } => {
            collector
                .collect(&request.place_id, collector.window(start, end))
                .await?
        }
        CollectMode::Latest(count) => collector.collect_latest(&request.place_id, count).await?,
    };
    Ok(Json(collection))
}
