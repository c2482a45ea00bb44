use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use metrics::counter;
use shuttle_axum::axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::acquire::cache::{CacheStats, MemeCache};
use crate::acquire::types::MemePost;
use crate::acquire::usage::UsageSnapshot;

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<MemeCache>,
    pub served: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(cache: Arc<MemeCache>) -> Self {
        Self {
            cache,
            served: Arc::new(AtomicU64::new(0)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/meme", get(serve_meme))
        .route("/stats", get(stats))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn serve_meme(State(state): State<AppState>) -> Json<MemePost> {
    let post = state.cache.take().await;
    state.served.fetch_add(1, Ordering::Relaxed);
    counter!("memes_served_total").increment(1);
    tracing::debug!(source = %post.source, "serving meme");
    Json(post)
}

#[derive(serde::Serialize)]
struct StatsResp {
    cache: CacheStats,
    usage: UsageSnapshot,
    usage_percent: BTreeMap<String, f64>,
    memes_served: u64,
}

async fn stats(State(state): State<AppState>) -> Json<StatsResp> {
    let usage = state.cache.chain().usage().snapshot();
    let usage_percent = usage
        .counts
        .keys()
        .map(|source| {
            let pct = (usage.percentage(source) * 10.0).round() / 10.0;
            (source.clone(), pct)
        })
        .collect();
    Json(StatsResp {
        cache: state.cache.stats(),
        usage,
        usage_percent,
        memes_served: state.served.load(Ordering::Relaxed),
    })
}
