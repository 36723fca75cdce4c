//! Shared health counters for the /health endpoint.
//! Updated by the scoring pipeline.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Process-lifetime pipeline counters. Updated by the orchestrator, read by API.
#[derive(Default)]
pub struct HealthState {
    pub scores_computed: AtomicU64,
    /// Scores computed from fallback (indexer-outage) metrics.
    pub degraded_aggregations: AtomicU64,
    pub commits_confirmed: AtomicU64,
    pub commits_failed: AtomicU64,
    /// Millisecond timestamp of the last completed scoring (0 = none).
    pub last_score_at_ms: AtomicU64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub scores_computed: u64,
    pub degraded_aggregations: u64,
    pub commits_confirmed: u64,
    pub commits_failed: u64,
    pub last_score_at_ms: u64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_score(&self, degraded: bool, at_ms: u64) {
        self.scores_computed.fetch_add(1, Ordering::Relaxed);
        if degraded {
            self.degraded_aggregations.fetch_add(1, Ordering::Relaxed);
        }
        self.last_score_at_ms.store(at_ms, Ordering::Relaxed);
    }

    pub fn record_commit(&self, confirmed: bool) {
        if confirmed {
            self.commits_confirmed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.commits_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            scores_computed: self.scores_computed.load(Ordering::Relaxed),
            degraded_aggregations: self.degraded_aggregations.load(Ordering::Relaxed),
            commits_confirmed: self.commits_confirmed.load(Ordering::Relaxed),
            commits_failed: self.commits_failed.load(Ordering::Relaxed),
            last_score_at_ms: self.last_score_at_ms.load(Ordering::Relaxed),
        }
    }
}
