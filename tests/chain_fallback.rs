// tests/chain_fallback.rs
//
// Fallback chain behavior with mock providers:
// - priority order short-circuits on first success
// - fetch and normalize failures are absorbed, next provider is tried
// - total exhaustion serves from the local corpus under the Fallback label

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::RngCore;
use serde_json::{json, Value};

use meme_relay::acquire::corpus::LocalCorpus;
use meme_relay::acquire::rate_gate::RateGate;
use meme_relay::acquire::types::{AcquireError, FetchContext, MemePost, MemeSource, FALLBACK_SOURCE};
use meme_relay::acquire::usage::UsageRecorder;
use meme_relay::acquire::FallbackChain;

struct CannedProvider {
    name: &'static str,
    media_url: &'static str,
    calls: Arc<AtomicU64>,
}

#[async_trait]
impl MemeSource for CannedProvider {
    fn name(&self) -> &'static str {
        self.name
    }
    fn endpoint(&self, _topic: &str) -> String {
        "http://canned.test/meme".to_string()
    }
    async fn fetch_raw(&self, _ctx: &FetchContext, _topic: &str) -> Result<Value, AcquireError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(json!({ "media_url": self.media_url }))
    }
    fn normalize(&self, raw: &Value, _rng: &mut dyn RngCore) -> Result<MemePost, AcquireError> {
        let url = raw["media_url"]
            .as_str()
            .ok_or_else(|| AcquireError::Normalization("missing media_url".into()))?;
        Ok(MemePost {
            title: "canned".to_string(),
            media_url: url.to_string(),
            community: "memes".to_string(),
            upvotes: 1,
            source: self.name.to_string(),
        })
    }
}

struct DownProvider {
    name: &'static str,
    err: fn() -> AcquireError,
    calls: Arc<AtomicU64>,
}

#[async_trait]
impl MemeSource for DownProvider {
    fn name(&self) -> &'static str {
        self.name
    }
    fn endpoint(&self, _topic: &str) -> String {
        "http://down.test/meme".to_string()
    }
    async fn fetch_raw(&self, _ctx: &FetchContext, _topic: &str) -> Result<Value, AcquireError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err((self.err)())
    }
    fn normalize(&self, _raw: &Value, _rng: &mut dyn RngCore) -> Result<MemePost, AcquireError> {
        Err(AcquireError::Normalization("fetch never succeeds".into()))
    }
}

/// Fetch succeeds but the payload never normalizes.
struct GarbledProvider {
    calls: Arc<AtomicU64>,
}

#[async_trait]
impl MemeSource for GarbledProvider {
    fn name(&self) -> &'static str {
        "Garbled"
    }
    fn endpoint(&self, _topic: &str) -> String {
        "http://garbled.test/meme".to_string()
    }
    async fn fetch_raw(&self, _ctx: &FetchContext, _topic: &str) -> Result<Value, AcquireError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(json!({ "unexpected": true }))
    }
    fn normalize(&self, raw: &Value, _rng: &mut dyn RngCore) -> Result<MemePost, AcquireError> {
        let url = raw["media_url"]
            .as_str()
            .ok_or_else(|| AcquireError::Normalization("missing media_url".into()))?;
        Ok(MemePost {
            title: "never".to_string(),
            media_url: url.to_string(),
            community: "memes".to_string(),
            upvotes: 0,
            source: self.name().to_string(),
        })
    }
}

fn chain_with(providers: Vec<Box<dyn MemeSource>>) -> FallbackChain {
    FallbackChain::new(
        providers,
        RateGate::new(Duration::ZERO),
        FetchContext::new(Duration::from_secs(1)),
        LocalCorpus::builtin(),
        Arc::new(UsageRecorder::new()),
    )
    .with_rng_seed(7)
}

#[tokio::test]
async fn first_provider_success_short_circuits() {
    let first_calls = Arc::new(AtomicU64::new(0));
    let second_calls = Arc::new(AtomicU64::new(0));
    let chain = chain_with(vec![
        Box::new(CannedProvider {
            name: "First",
            media_url: "https://first.test/a.png",
            calls: Arc::clone(&first_calls),
        }),
        Box::new(CannedProvider {
            name: "Second",
            media_url: "https://second.test/b.png",
            calls: Arc::clone(&second_calls),
        }),
    ]);

    let post = chain.acquire("memes").await;
    assert_eq!(post.source, "First");
    assert_eq!(post.media_url, "https://first.test/a.png");
    assert_eq!(first_calls.load(Ordering::Relaxed), 1);
    assert_eq!(second_calls.load(Ordering::Relaxed), 0);
    assert_eq!(chain.usage().count("First"), 1);
}

#[tokio::test]
async fn fetch_failure_falls_through_to_next_provider() {
    let down_calls = Arc::new(AtomicU64::new(0));
    let ok_calls = Arc::new(AtomicU64::new(0));
    let chain = chain_with(vec![
        Box::new(DownProvider {
            name: "Flaky",
            err: || AcquireError::UpstreamStatus(503),
            calls: Arc::clone(&down_calls),
        }),
        Box::new(CannedProvider {
            name: "Backup",
            media_url: "https://backup.test/c.png",
            calls: Arc::clone(&ok_calls),
        }),
    ]);

    let post = chain.acquire("memes").await;
    assert_eq!(post.source, "Backup");
    assert_eq!(down_calls.load(Ordering::Relaxed), 1);
    assert_eq!(ok_calls.load(Ordering::Relaxed), 1);
    assert_eq!(chain.usage().count("Flaky"), 0);
    assert_eq!(chain.usage().count("Backup"), 1);
}

#[tokio::test]
async fn normalize_failure_is_absorbed_like_a_fetch_failure() {
    let garbled_calls = Arc::new(AtomicU64::new(0));
    let ok_calls = Arc::new(AtomicU64::new(0));
    let chain = chain_with(vec![
        Box::new(GarbledProvider {
            calls: Arc::clone(&garbled_calls),
        }),
        Box::new(CannedProvider {
            name: "Backup",
            media_url: "https://backup.test/d.png",
            calls: Arc::clone(&ok_calls),
        }),
    ]);

    let post = chain.acquire("memes").await;
    assert_eq!(post.source, "Backup");
    assert_eq!(garbled_calls.load(Ordering::Relaxed), 1);
    assert_eq!(chain.usage().count("Garbled"), 0);
}

#[tokio::test]
async fn timeout_then_garbled_then_success_attributes_the_third() {
    let a_calls = Arc::new(AtomicU64::new(0));
    let b_calls = Arc::new(AtomicU64::new(0));
    let c_calls = Arc::new(AtomicU64::new(0));
    let chain = chain_with(vec![
        Box::new(DownProvider {
            name: "A",
            err: || AcquireError::Timeout(Duration::from_secs(10)),
            calls: Arc::clone(&a_calls),
        }),
        Box::new(GarbledProvider {
            calls: Arc::clone(&b_calls),
        }),
        Box::new(CannedProvider {
            name: "C",
            media_url: "https://c.test/x.png",
            calls: Arc::clone(&c_calls),
        }),
    ]);

    let post = chain.acquire("memes").await;
    assert_eq!(post.source, "C");
    assert_eq!(chain.usage().count("C"), 1);
    assert_eq!(chain.usage().count("A"), 0);
    assert_eq!(chain.usage().count("Garbled"), 0);
    assert_eq!(a_calls.load(Ordering::Relaxed), 1);
    assert_eq!(b_calls.load(Ordering::Relaxed), 1);
    assert_eq!(c_calls.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn exhaustion_serves_from_the_local_corpus() {
    let a = Arc::new(AtomicU64::new(0));
    let b = Arc::new(AtomicU64::new(0));
    let chain = chain_with(vec![
        Box::new(DownProvider {
            name: "DownA",
            err: || AcquireError::Timeout(Duration::from_secs(10)),
            calls: Arc::clone(&a),
        }),
        Box::new(DownProvider {
            name: "DownB",
            err: || AcquireError::UpstreamStatus(503),
            calls: Arc::clone(&b),
        }),
    ]);

    let post = chain.acquire("memes").await;
    assert_eq!(post.source, FALLBACK_SOURCE);
    assert!(chain.corpus().contains_media_url(&post.media_url));
    assert_eq!(a.load(Ordering::Relaxed), 1);
    assert_eq!(b.load(Ordering::Relaxed), 1);
    assert_eq!(chain.usage().count(FALLBACK_SOURCE), 1);
    assert_eq!(chain.usage().snapshot().total, 1);
}
