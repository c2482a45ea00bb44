// src/acquire/scheduler.rs
use std::sync::Arc;

use metrics::counter;
use tokio::task::JoinHandle;

use crate::acquire::cache::MemeCache;

#[derive(Clone, Copy, Debug)]
pub struct RefreshSchedulerCfg {
    pub interval_secs: u64,
}

/// Spawn the periodic cache refresh task. The first tick fires immediately,
/// which doubles as the initial cache fill at startup; refill() itself is
/// guarded, so overlap with watermark-triggered refills is harmless.
pub fn spawn_refresh_scheduler(cache: Arc<MemeCache>, cfg: RefreshSchedulerCfg) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs));
        loop {
            ticker.tick().await;
            cache.refill().await;
            counter!("cache_refresh_ticks_total").increment(1);

            let stats = cache.stats();
            tracing::info!(
                target: "acquire",
                len = stats.len,
                capacity = stats.capacity,
                "cache refresh tick"
            );
        }
    })
}
