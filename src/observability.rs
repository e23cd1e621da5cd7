//! Observability: tracing setup and in-process counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    dispatches_succeeded: AtomicU64,
    dispatches_failed: AtomicU64,
    probes_run: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch_succeeded(&self) {
        self.dispatches_succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "dispatches_succeeded", "Metric incremented");
    }

    pub fn dispatch_failed(&self) {
        self.dispatches_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "dispatches_failed", "Metric incremented");
    }

    pub fn probe_run(&self) {
        self.probes_run.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "probes_run", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatches_succeeded: self.dispatches_succeeded.load(Ordering::Relaxed),
            dispatches_failed: self.dispatches_failed.load(Ordering::Relaxed),
            probes_run: self.probes_run.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub dispatches_succeeded: u64,
    pub dispatches_failed: u64,
    pub probes_run: u64,
}
