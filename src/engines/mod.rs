// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod markup_engine;
pub mod pacer;
pub mod rendered_engine;
pub mod router;
pub mod structured_api;
pub mod traits;

pub use router::AcquisitionClient;
pub use traits::{AcquisitionTier, FetchError, TierContext, TierError};
