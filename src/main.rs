// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use placewatch::config::Settings;
use placewatch::domain::services::rank_service::RankService;
use placewatch::domain::services::reply_automation::ReplyAutomation;
use placewatch::domain::services::review_collector::{ReviewCollector, ReviewFeed};
use placewatch::engines::markup_engine::MarkupTier;
use placewatch::engines::pacer::RequestPacer;
use placewatch::engines::rendered_engine::RenderedCrawlTier;
use placewatch::engines::structured_api::StructuredApiTier;
use placewatch::engines::{AcquisitionClient, AcquisitionTier};
use placewatch::infrastructure::automation::BrowserReplyAutomation;
use placewatch::infrastructure::browser::BrowserLauncher;
use placewatch::infrastructure::proxy::{HttpProxyProbe, ProxyPool, ProxyProbe};
use placewatch::presentation::routes::{self, AppServices};
use placewatch::queue::ReplyQueue;
use placewatch::utils::telemetry;
use placewatch::workers::{ReplyWorker, SweepWorker, WorkerManager};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging and metrics
    telemetry::init_telemetry(settings.server.json_logs);
    info!("Starting placewatch...");
    placewatch::infrastructure::metrics::init_metrics(&settings.metrics.address);

    // 3. Proxy pool
    let pool = Arc::new(ProxyPool::new(
        settings.proxy.urls.clone(),
        settings.proxy.pool_config(),
    ));
    let probe: Arc<dyn ProxyProbe> = Arc::new(HttpProxyProbe::new(
        settings.proxy.probe_url.clone(),
        Duration::from_millis(settings.proxy.probe_timeout_ms),
    ));
    if !pool.is_empty() {
        pool.test_all(probe.as_ref()).await;
    }
    info!("Proxy pool ready: {}/{} active", pool.active_count(), pool.len());

    // 4. Acquisition tiers, in fallback order
    let acquisition = &settings.acquisition;
    let request_timeout = Duration::from_millis(acquisition.request_timeout_ms);
    let launcher = Arc::new(BrowserLauncher::new(
        settings.automation.remote_debugging_url.clone(),
        request_timeout,
    ));

    let mut tiers: Vec<Arc<dyn AcquisitionTier>> = vec![
        Arc::new(StructuredApiTier::new(
            acquisition.api_url.clone(),
            acquisition.api_referer.clone(),
        )),
        Arc::new(MarkupTier::new(acquisition.markup_url.clone())),
    ];
    if acquisition.enable_render_tier {
        tiers.push(Arc::new(RenderedCrawlTier::new(
            launcher.clone(),
            acquisition.render_url.clone(),
        )));
    }

    let client = Arc::new(
        AcquisitionClient::new(tiers, pool.clone())
            .with_pacer(RequestPacer::new(Duration::from_millis(
                acquisition.min_request_delay_ms,
            )))
            .with_retry_policy(acquisition.retry_policy())
            .with_request_timeout(request_timeout),
    );
    info!("Acquisition tiers: {:?}", client.tier_names());

    let ranks = Arc::new(
        RankService::new(client.clone(), acquisition.batch_concurrency)
            .with_constraints(acquisition.constraints()),
    );
    let feed: Arc<dyn ReviewFeed> = client.clone();
    let collector = Arc::new(
        ReviewCollector::new(feed, settings.collector.scaling())
            .with_page_size(settings.collector.page_size),
    );

    // 5. Reply queue and workers
    let queue = Arc::new(ReplyQueue::new(settings.queue.queue_config()?));
    let automation: Arc<dyn ReplyAutomation> = Arc::new(
        BrowserReplyAutomation::new(launcher, settings.automation.reviews_url.clone())
            .with_login_marker(settings.automation.login_marker.clone())
            .with_navigation_timeout(Duration::from_secs(
                settings.automation.navigation_timeout_s,
            )),
    );

    let mut workers = WorkerManager::new();
    workers.spawn(Arc::new(
        ReplyWorker::new(queue.clone(), automation, workers.shutdown_signal())
            .with_inter_job_pause(Duration::from_millis(settings.queue.inter_job_pause_ms)),
    ));
    workers.spawn(Arc::new(
        SweepWorker::new(queue.clone(), workers.shutdown_signal())
            .with_interval(Duration::from_secs(settings.queue.sweep_interval_s)),
    ));

    // 6. Start HTTP server
    let app = routes::app(AppServices {
        client,
        ranks,
        collector,
        queue,
        probe,
        constraints: acquisition.constraints(),
    });

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    let mut shutdown = workers.shutdown_signal();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
            })
            .await
    });

    workers.wait_for_shutdown().await;
    match server.await {
        Ok(Ok(())) => info!("Server stopped"),
        Ok(Err(e)) => error!("Server error: {}", e),
        Err(e) => error!("Server task failed: {}", e),
    }

    Ok(())
}
