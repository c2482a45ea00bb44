// src/acquire/fetch.rs
use metrics::histogram;
use serde_json::Value;

use crate::acquire::types::{AcquireError, FetchContext};

/// Perform exactly one HTTP GET with a hard deadline.
///
/// When the deadline elapses the in-flight reqwest future is dropped, which
/// aborts the underlying connection; the caller sees `AcquireError::Timeout`.
/// Non-2xx statuses and transport failures map to their own variants. No
/// retries happen here; retry policy lives in the fallback chain.
pub async fn bounded_fetch(ctx: &FetchContext, url: &str) -> Result<Value, AcquireError> {
    let t0 = std::time::Instant::now();

    let call = async {
        let resp = ctx
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &ctx.user_agent)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(AcquireError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AcquireError::UpstreamStatus(status.as_u16()));
        }

        resp.json::<Value>().await.map_err(AcquireError::Transport)
    };

    let out = match tokio::time::timeout(ctx.timeout, call).await {
        Ok(res) => res,
        Err(_) => Err(AcquireError::Timeout(ctx.timeout)),
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("fetch_ms").record(ms);

    out
}
