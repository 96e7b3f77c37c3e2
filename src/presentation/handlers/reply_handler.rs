// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    application::dto::reply_response::ReplySubmittedDto,
    domain::models::job::ReplyPayload,
    presentation::errors::AppError,
    queue::ReplyQueue,
};

/// 提交回复任务
pub async fn submit_reply(
    Extension(queue): Extension<Arc<ReplyQueue>>,
    Json(payload): Json<ReplyPayload>,
) -> Result<(StatusCode, Json<ReplySubmittedDto>), AppError> {
    let id = queue.submit(payload)?;
    Ok((StatusCode::ACCEPTED, Json(ReplySubmittedDto { id })))
}

/// 轮询回复任务状态
///
/// 每次轮询都会让任务保持存活
pub async fn get_reply_status(
    Extension(queue): Extension<Arc<ReplyQueue>>,
    Path(id): Path<Uuid>,
) -> Response {
    match queue.poll(id) {
        Some(document) => Json(document).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Job {} not found", id) })),
        )
            .into_response(),
    }
}
