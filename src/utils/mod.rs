// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod date_parser;
pub mod errors;
pub mod number_format;
pub mod retry_policy;
pub mod state_blob;
pub mod telemetry;
