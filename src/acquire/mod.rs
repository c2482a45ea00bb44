// src/acquire/mod.rs
pub mod cache;
pub mod config;
pub mod corpus;
pub mod fetch;
pub mod providers;
pub mod rate_gate;
pub mod scheduler;
pub mod types;
pub mod usage;

use std::sync::Arc;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::acquire::corpus::LocalCorpus;
use crate::acquire::rate_gate::RateGate;
use crate::acquire::types::{FetchContext, MemePost, MemeSource, FALLBACK_SOURCE};
use crate::acquire::usage::UsageRecorder;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "acquire_success_total",
            "Posts acquired from an upstream provider."
        );
        describe_counter!(
            "acquire_provider_errors_total",
            "Provider fetch/normalize failures absorbed by the chain."
        );
        describe_counter!(
            "acquire_fallback_total",
            "Acquisitions served from the local corpus after exhaustion."
        );
        describe_counter!("memes_served_total", "Posts delivered to consumers.");
        describe_counter!("cache_refill_runs_total", "Completed cache refill passes.");
        describe_counter!(
            "cache_refresh_ticks_total",
            "Periodic refresh scheduler ticks."
        );
        describe_gauge!("meme_cache_size", "Posts currently buffered in the cache.");
        describe_gauge!("meme_cache_capacity", "Configured cache capacity.");
        describe_histogram!("fetch_ms", "Upstream fetch time in milliseconds.");
        describe_histogram!(
            "rate_gate_wait_ms",
            "Time spent waiting on the global rate gate."
        );
    });
}

/// Normalize an upstream post title: decode HTML entities, strip stray
/// markup, collapse whitespace, cap the length.
pub fn normalize_title(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // Length cap: 300 chars (embed titles truncate beyond this anyway)
    if out.chars().count() > 300 {
        out = out.chars().take(300).collect();
    }

    out
}

/// Ordered multi-provider fallback chain. `acquire` is total: every
/// per-provider failure is absorbed, and the local corpus is the last line
/// of defense.
pub struct FallbackChain {
    providers: Vec<Box<dyn MemeSource>>,
    gate: RateGate,
    ctx: FetchContext,
    corpus: LocalCorpus,
    usage: Arc<UsageRecorder>,
    rng_seed: Option<u64>,
}

impl FallbackChain {
    pub fn new(
        providers: Vec<Box<dyn MemeSource>>,
        gate: RateGate,
        ctx: FetchContext,
        corpus: LocalCorpus,
        usage: Arc<UsageRecorder>,
    ) -> Self {
        Self {
            providers,
            gate,
            ctx,
            corpus,
            usage,
            rng_seed: None,
        }
    }

    /// Pin candidate selection to a fixed seed. Test hook; production uses OS
    /// entropy per call.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn usage(&self) -> &Arc<UsageRecorder> {
        &self.usage
    }

    pub fn corpus(&self) -> &LocalCorpus {
        &self.corpus
    }

    fn make_rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Acquire one post. Never fails: providers are tried in priority order
    /// through the rate gate, failures are logged and absorbed, and total
    /// exhaustion falls back to the local corpus.
    pub async fn acquire(&self, topic: &str) -> MemePost {
        ensure_metrics_described();

        for provider in &self.providers {
            self.gate.acquire().await;
            tracing::debug!(provider = provider.name(), "trying provider");

            let raw = match provider.fetch_raw(&self.ctx, topic).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(error = %e, provider = provider.name(), "provider fetch error");
                    counter!("acquire_provider_errors_total").increment(1);
                    continue;
                }
            };

            match provider.normalize(&raw, &mut self.make_rng()) {
                Ok(post) => {
                    self.usage.record(provider.name());
                    counter!("acquire_success_total", "provider" => provider.name()).increment(1);
                    return post;
                }
                Err(e) => {
                    tracing::warn!(error = %e, provider = provider.name(), "provider normalize error");
                    counter!("acquire_provider_errors_total").increment(1);
                }
            }
        }

        tracing::info!("all providers exhausted, serving from local corpus");
        self.usage.record(FALLBACK_SOURCE);
        counter!("acquire_fallback_total").increment(1);
        self.corpus.pick(&mut self.make_rng())
    }
}
