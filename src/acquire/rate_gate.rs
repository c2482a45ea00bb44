// src/acquire/rate_gate.rs
use std::time::Duration;

use metrics::histogram;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Process-wide gate enforcing a minimum spacing between the *start* of
/// successive upstream calls, shared by every provider.
///
/// The wait happens while holding the internal mutex, so concurrent callers
/// serialize their compute-and-wait step. A read-then-sleep outside the lock
/// would let two callers observe the same last-grant time and start too close
/// together. No FIFO fairness among waiters is guaranteed.
#[derive(Debug)]
pub struct RateGate {
    spacing: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            last_grant: Mutex::new(None),
        }
    }

    /// Suspend until at least `spacing` has elapsed since the previous grant,
    /// then record the new grant time and return.
    pub async fn acquire(&self) {
        let t0 = Instant::now();
        let mut last = self.last_grant.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.spacing;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
        drop(last);

        let waited_ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("rate_gate_wait_ms").record(waited_ms);
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }
}
