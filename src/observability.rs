//! Logging setup and batch counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,multifetch=debug";

/// Install the stderr `fmt` subscriber, filtered by `RUST_LOG`
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Counters shared by every batch run through one orchestrator
#[derive(Debug, Default)]
pub struct Metrics {
    batches: AtomicU64,
    resources_fetched: AtomicU64,
    resources_failed: AtomicU64,
    bytes_fetched: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_completed(&self) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "batches", "Metric incremented");
    }

    pub fn resource_fetched(&self, bytes: usize) {
        self.resources_fetched.fetch_add(1, Ordering::Relaxed);
        self.bytes_fetched.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn resource_failed(&self) {
        self.resources_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches: self.batches.load(Ordering::Relaxed),
            resources_fetched: self.resources_fetched.load(Ordering::Relaxed),
            resources_failed: self.resources_failed.load(Ordering::Relaxed),
            bytes_fetched: self.bytes_fetched.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches: u64,
    pub resources_fetched: u64,
    pub resources_failed: u64,
    pub bytes_fetched: u64,
}
