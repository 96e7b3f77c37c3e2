// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 回复写回的单消费者工作器、定期清理工作器和它们的生命周期管理
pub mod manager;
pub mod reply_worker;
pub mod sweep_worker;
pub mod worker;

pub use manager::WorkerManager;
pub use reply_worker::ReplyWorker;
pub use sweep_worker::SweepWorker;
pub use worker::Worker;
