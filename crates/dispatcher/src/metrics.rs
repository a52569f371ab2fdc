//! Per-connection metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single pooled connection
#[derive(Debug, Default)]
pub struct ConnectionMetrics {
    /// Total successful writes
    write_count: AtomicU64,
    /// Total write failures
    failure_count: AtomicU64,
    /// Total schema recovery attempts
    recovery_count: AtomicU64,
    /// Failed schema recovery attempts
    recovery_failure_count: AtomicU64,
}

impl ConnectionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    pub fn inc_write_count(&self) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn recovery_count(&self) -> u64 {
        self.recovery_count.load(Ordering::Relaxed)
    }

    pub fn recovery_failure_count(&self) -> u64 {
        self.recovery_failure_count.load(Ordering::Relaxed)
    }

    /// Count one recovery attempt and its outcome
    pub fn record_recovery(&self, success: bool) {
        self.recovery_count.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.recovery_failure_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            write_count: self.write_count(),
            failure_count: self.failure_count(),
            recovery_count: self.recovery_count(),
            recovery_failure_count: self.recovery_failure_count(),
        }
    }
}

/// Snapshot of connection counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub write_count: u64,
    pub failure_count: u64,
    pub recovery_count: u64,
    pub recovery_failure_count: u64,
}
