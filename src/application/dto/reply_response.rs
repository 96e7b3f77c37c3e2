// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 提交回复后返回的任务标识
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplySubmittedDto {
    pub id: Uuid,
}
