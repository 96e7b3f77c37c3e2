// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use placewatch::infrastructure::proxy::{ProxyPool, ProxyPoolConfig};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn egresses(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("http://10.1.0.{}:8080", i + 1))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reports_are_not_lost() {
    let pool = Arc::new(ProxyPool::new(
        egresses(4),
        ProxyPoolConfig {
            max_failures: 1000,
            cooldown: Duration::ZERO,
            ..ProxyPoolConfig::default()
        },
    ));

    let mut handles = Vec::new();
    for task in 0..16 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            for round in 0..50 {
                let egress = pool.acquire().unwrap();
                if (task + round) % 2 == 0 {
                    pool.report_success(&egress, Duration::from_millis(20));
                } else {
                    pool.report_failure(&egress, "connection reset");
                }
                tokio::task::yield_now().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let records = pool.snapshot();
    let successes: u64 = records.iter().map(|r| r.success_count).sum();
    let failures: u64 = records.iter().map(|r| u64::from(r.failure_count)).sum();

    // Successes decrement the failure counter, so only an upper bound holds
    assert_eq!(successes, 400);
    assert!(failures <= 400);
    assert!(records.iter().all(|r| r.active));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deactivated_proxy_is_never_handed_out() {
    let urls = egresses(3);
    let dead = urls[0].clone();
    let pool = Arc::new(ProxyPool::new(
        urls,
        ProxyPoolConfig {
            max_failures: 3,
            cooldown: Duration::ZERO,
            ..ProxyPoolConfig::default()
        },
    ));

    for _ in 0..3 {
        pool.report_failure(&dead, "timed out");
    }
    assert_eq!(pool.active_count(), 2);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let mut seen = HashSet::new();
            for _ in 0..100 {
                if let Some(egress) = pool.acquire() {
                    seen.insert(egress);
                }
            }
            seen
        }));
    }

    for handle in handles {
        let seen = handle.await.unwrap();
        assert!(!seen.contains(&dead));
    }

    assert!(pool.reset(&dead));
    assert_eq!(pool.active_count(), 3);
    assert!(!pool.reset("http://unknown:1"));
}

#[tokio::test]
async fn test_exhausted_pool_falls_back_to_direct() {
    let pool = ProxyPool::new(egresses(2), ProxyPoolConfig::default());
    for egress in egresses(2) {
        for _ in 0..3 {
            pool.report_failure(&egress, "403 forbidden");
        }
    }

    assert_eq!(pool.active_count(), 0);
    assert_eq!(pool.acquire(), None);

    pool.reset_all();
    assert!(pool.acquire().is_some());
}

#[tokio::test]
async fn test_empty_pool_means_direct_connection() {
    let pool = ProxyPool::new(Vec::<String>::new(), ProxyPoolConfig::default());
    assert!(pool.is_empty());
    assert_eq!(pool.acquire(), None);
    assert!(pool.snapshot().is_empty());
}
