// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod proxy_handler;
pub mod reply_handler;
pub mod review_handler;
pub mod search_handler;
