//! Meme Relay — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the provider chain, cache, and routes.
//!
//! See `README.md` for quickstart.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use meme_relay::acquire::cache::MemeCache;
use meme_relay::acquire::config::RelayConfig;
use meme_relay::acquire::corpus::LocalCorpus;
use meme_relay::acquire::providers::build_chain;
use meme_relay::acquire::rate_gate::RateGate;
use meme_relay::acquire::scheduler::{spawn_refresh_scheduler, RefreshSchedulerCfg};
use meme_relay::acquire::types::FetchContext;
use meme_relay::acquire::usage::UsageRecorder;
use meme_relay::acquire::FallbackChain;
use meme_relay::api::{create_router, AppState};
use meme_relay::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - RELAY_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("RELAY_DEV_LOG").ok().is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("acquire=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This enables MEME_RELAY_CONFIG_PATH from .env so config.rs can pick it up.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let cfg = RelayConfig::load_default().expect("Failed to load relay config");

    // Prometheus recorder must be installed before any series is touched.
    let metrics = Metrics::init(cfg.cache_capacity);

    let corpus = match &cfg.corpus_path {
        Some(p) => LocalCorpus::from_file(p).expect("Failed to load corpus file"),
        None => LocalCorpus::builtin(),
    };

    let providers = build_chain(&cfg.providers).expect("Failed to build provider chain");
    let chain = Arc::new(FallbackChain::new(
        providers,
        RateGate::new(cfg.rate_spacing()),
        FetchContext::new(cfg.fetch_timeout()),
        corpus,
        Arc::new(UsageRecorder::new()),
    ));

    let cache = Arc::new(MemeCache::new(
        chain,
        cfg.subreddit.clone(),
        cfg.cache_capacity,
        cfg.low_watermark,
        cfg.refill_parallelism,
    ));

    // First tick fires immediately and doubles as the initial cache fill.
    spawn_refresh_scheduler(
        Arc::clone(&cache),
        RefreshSchedulerCfg {
            interval_secs: cfg.refresh_interval_secs,
        },
    );

    let state = AppState::new(cache);
    let router = create_router(state).merge(metrics.router());

    Ok(router.into())
}
