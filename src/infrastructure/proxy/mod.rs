// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod pool;
pub mod probe;

pub use pool::{ProxyHealthReport, ProxyPool, ProxyPoolConfig};
pub use probe::{HttpProxyProbe, ProxyProbe};
