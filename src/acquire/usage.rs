// src/acquire/usage.rs
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Counts successful acquisitions per source label. Counters only ever go up;
/// there is no removal operation.
#[derive(Debug, Default)]
pub struct UsageRecorder {
    inner: Mutex<HashMap<String, u64>>,
}

/// Read-only copy of the counters at one point in time, plus their sum for
/// derived percentage reporting.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct UsageSnapshot {
    pub counts: BTreeMap<String, u64>,
    pub total: u64,
}

impl UsageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, source: &str) {
        let mut map = self.inner.lock().expect("usage recorder mutex poisoned");
        *map.entry(source.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, source: &str) -> u64 {
        let map = self.inner.lock().expect("usage recorder mutex poisoned");
        map.get(source).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        let map = self.inner.lock().expect("usage recorder mutex poisoned");
        let counts: BTreeMap<String, u64> = map.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let total = counts.values().sum();
        UsageSnapshot { counts, total }
    }
}

impl UsageSnapshot {
    /// Share of `source` in percent, one decimal of precision is up to the
    /// caller; returns 0.0 when nothing has been recorded yet.
    pub fn percentage(&self, source: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let count = self.counts.get(source).copied().unwrap_or(0);
        (count as f64 / self.total as f64) * 100.0
    }
}
