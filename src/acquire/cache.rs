// src/acquire/cache.rs
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use metrics::{counter, gauge};
use tokio::task::JoinSet;

use crate::acquire::types::MemePost;
use crate::acquire::FallbackChain;

/// Bounded FIFO buffer of pre-fetched posts with watermark-triggered
/// background replenishment.
///
/// The queue and the refill flag are the only shared mutable state here:
/// the queue is mutex-guarded, the flag is claimed with compare-exchange so
/// at most one refill is in flight at any time.
pub struct MemeCache {
    queue: Mutex<VecDeque<MemePost>>,
    refilling: AtomicBool,
    refill_runs: AtomicU64,
    last_refilled_unix: AtomicU64, // 0 = never refilled
    capacity: usize,
    low_watermark: usize,
    refill_parallelism: usize,
    topic: String,
    chain: Arc<FallbackChain>,
}

/// Point-in-time view of the cache, surfaced by /stats.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub len: usize,
    pub capacity: usize,
    pub refilling: bool,
    pub refill_runs: u64,
    pub last_refilled_unix: Option<u64>,
}

/// Clears the refill flag on every exit path, including panics in the
/// refill body.
struct ClearFlag<'a>(&'a AtomicBool);

impl Drop for ClearFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl MemeCache {
    pub fn new(
        chain: Arc<FallbackChain>,
        topic: impl Into<String>,
        capacity: usize,
        low_watermark: usize,
        refill_parallelism: usize,
    ) -> Self {
        debug_assert!(low_watermark < capacity);
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            refilling: AtomicBool::new(false),
            refill_runs: AtomicU64::new(0),
            last_refilled_unix: AtomicU64::new(0),
            capacity,
            low_watermark,
            refill_parallelism: refill_parallelism.max(1),
            topic: topic.into(),
            chain,
        }
    }

    /// Serve one post. Fast path pops the queue head and, when the remaining
    /// length is at or below the watermark, schedules one background refill.
    /// An empty queue falls through to a direct chain acquisition; either way
    /// the caller always gets a post.
    pub async fn take(self: &Arc<Self>) -> MemePost {
        let (popped, remaining) = {
            let mut q = self.queue.lock().expect("meme cache mutex poisoned");
            let popped = q.pop_front();
            (popped, q.len())
        };

        match popped {
            Some(post) => {
                gauge!("meme_cache_size").set(remaining as f64);
                if remaining <= self.low_watermark && !self.refilling.load(Ordering::Acquire) {
                    let me = Arc::clone(self);
                    tokio::spawn(async move { me.refill().await });
                }
                post
            }
            None => self.chain.acquire(&self.topic).await,
        }
    }

    /// Top the queue back up to capacity. Idempotent under concurrent
    /// triggers: a caller that observes another refill in flight returns
    /// immediately. Cannot fail outright, since each underlying acquisition
    /// is itself total.
    pub async fn refill(&self) {
        if self
            .refilling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let _clear = ClearFlag(&self.refilling);

        let needed = {
            let q = self.queue.lock().expect("meme cache mutex poisoned");
            self.capacity.saturating_sub(q.len())
        };
        if needed == 0 {
            return;
        }
        tracing::debug!(needed, "refilling meme cache");

        // Bounded task-and-collect: at most `refill_parallelism` acquisitions
        // in flight, every outcome collected, no early abort on a slow branch.
        let mut set: JoinSet<MemePost> = JoinSet::new();
        let mut launched = 0usize;
        let mut obtained: Vec<MemePost> = Vec::with_capacity(needed);

        while launched < needed && set.len() < self.refill_parallelism {
            let chain = Arc::clone(&self.chain);
            let topic = self.topic.clone();
            set.spawn(async move { chain.acquire(&topic).await });
            launched += 1;
        }
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(post) => obtained.push(post),
                Err(e) => tracing::warn!(error = %e, "refill acquisition task failed"),
            }
            if launched < needed {
                let chain = Arc::clone(&self.chain);
                let topic = self.topic.clone();
                set.spawn(async move { chain.acquire(&topic).await });
                launched += 1;
            }
        }

        let len = {
            let mut q = self.queue.lock().expect("meme cache mutex poisoned");
            for post in obtained {
                if q.len() >= self.capacity {
                    break;
                }
                q.push_back(post);
            }
            q.len()
        };

        self.refill_runs.fetch_add(1, Ordering::Relaxed);
        self.last_refilled_unix
            .store(chrono::Utc::now().timestamp().max(0) as u64, Ordering::Relaxed);
        counter!("cache_refill_runs_total").increment(1);
        gauge!("meme_cache_size").set(len as f64);
        tracing::info!(len, capacity = self.capacity, "meme cache refilled");
    }

    pub fn len(&self) -> usize {
        self.queue.lock().expect("meme cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        let last = self.last_refilled_unix.load(Ordering::Relaxed);
        CacheStats {
            len: self.len(),
            capacity: self.capacity,
            refilling: self.refilling.load(Ordering::Acquire),
            refill_runs: self.refill_runs.load(Ordering::Relaxed),
            last_refilled_unix: (last > 0).then_some(last),
        }
    }

    pub fn chain(&self) -> &Arc<FallbackChain> {
        &self.chain
    }
}
