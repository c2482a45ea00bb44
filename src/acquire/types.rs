// src/acquire/types.rs
use std::time::Duration;

use rand::RngCore;
use serde_json::Value;

/// One deliverable meme post. Immutable once constructed; `source` is the
/// provider name, or "Fallback" for corpus-served posts.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct MemePost {
    pub title: String,
    pub media_url: String,
    pub community: String, // e.g. "programmerhumor"
    pub upvotes: u64,
    pub source: String,
}

/// Source label attributed when every provider has been exhausted.
pub const FALLBACK_SOURCE: &str = "Fallback";

/// Failure of a single provider attempt. All variants are absorbed by the
/// fallback chain; none of them reach a consumer.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("upstream call exceeded deadline of {0:?}")]
    Timeout(Duration),
    #[error("upstream returned status {0}")]
    UpstreamStatus(u16),
    #[error("normalization failed: {0}")]
    Normalization(String),
}

/// Shared HTTP environment for provider fetches: one reqwest client, the
/// per-call deadline, and the identifying User-Agent.
#[derive(Debug, Clone)]
pub struct FetchContext {
    pub client: reqwest::Client,
    pub timeout: Duration,
    pub user_agent: String,
}

impl FetchContext {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
            user_agent: "meme-relay/1.0".to_string(),
        }
    }
}

/// A single upstream meme provider: endpoint construction plus response
/// normalization. Implementations are stateless; the chain owns rate gating
/// and ordering.
#[async_trait::async_trait]
pub trait MemeSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Build the request URL for `topic` (e.g. a subreddit name).
    fn endpoint(&self, topic: &str) -> String;

    /// Perform one deadline-bounded fetch of the raw JSON payload.
    /// Overridden in tests to inject canned payloads or failures.
    async fn fetch_raw(&self, ctx: &FetchContext, topic: &str) -> Result<Value, AcquireError> {
        crate::acquire::fetch::bounded_fetch(ctx, &self.endpoint(topic)).await
    }

    /// Validate the raw payload shape and extract one post. Selection among
    /// multiple valid candidates draws from `rng` so tests can seed it.
    fn normalize(&self, raw: &Value, rng: &mut dyn RngCore) -> Result<MemePost, AcquireError>;
}
