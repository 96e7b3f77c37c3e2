// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 回复写回任务的排队、轮询和清理
pub mod reply_queue;

pub use reply_queue::{QueueError, ReplyQueue, ReplyQueueConfig, CLIENT_DISCONNECTED};
