// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod acquisition_fallback_test;
pub mod api_test;
pub mod helpers;
pub mod reply_flow_test;
pub mod review_collection_test;
