//! Per-client delivery metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Delivery counters for a single client connection
#[derive(Debug, Default)]
pub struct ClientMetrics {
    /// Events accepted onto the send queue
    queued_count: AtomicU64,
    /// Events written to the socket
    delivered_count: AtomicU64,
    /// Events dropped because the queue was full
    dropped_count: AtomicU64,
    /// Socket write failures
    failure_count: AtomicU64,
}

impl ClientMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queued_count(&self) -> u64 {
        self.queued_count.load(Ordering::Relaxed)
    }

    pub fn inc_queued(&self) {
        self.queued_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    pub fn inc_delivered(&self) {
        self.delivered_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failures(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> ClientMetricsSnapshot {
        ClientMetricsSnapshot {
            queued_count: self.queued_count(),
            delivered_count: self.delivered_count(),
            dropped_count: self.dropped_count(),
            failure_count: self.failure_count(),
        }
    }
}

/// Snapshot of client metrics (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct ClientMetricsSnapshot {
    pub queued_count: u64,
    pub delivered_count: u64,
    pub dropped_count: u64,
    pub failure_count: u64,
}
