//! Metrics collector implementation

use super::{
    record_counter, record_gauge, record_histogram, MetricsSnapshot, APPENDS, LOCK_CONTENDED,
    LOCK_WAIT_MS, NODES_CREATED, NODES_DESTROYED, NODES_LIVE, NOOP_POPS, POPS, TRAVERSALS,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counts hierarchy operations, optionally mirroring them to the `metrics` facade
#[derive(Debug)]
pub struct MetricsCollector {
    export: bool,
    nodes_created: AtomicU64,
    nodes_destroyed: AtomicU64,
    appends: AtomicU64,
    pops: AtomicU64,
    noop_pops: AtomicU64,
    traversals: AtomicU64,
    lock_contentions: AtomicU64,
}

impl MetricsCollector {
    /// Create a collector that also exports to the `metrics` facade
    pub fn new() -> Self {
        Self::with_export(true)
    }

    pub fn with_export(export: bool) -> Self {
        Self {
            export,
            nodes_created: AtomicU64::new(0),
            nodes_destroyed: AtomicU64::new(0),
            appends: AtomicU64::new(0),
            pops: AtomicU64::new(0),
            noop_pops: AtomicU64::new(0),
            traversals: AtomicU64::new(0),
            lock_contentions: AtomicU64::new(0),
        }
    }

    /// Whether values are mirrored to the `metrics` facade
    pub fn exports(&self) -> bool {
        self.export
    }

    pub fn inc_nodes_created(&self, live: usize) {
        self.nodes_created.fetch_add(1, Ordering::Relaxed);
        if self.export {
            record_counter(NODES_CREATED, 1);
            record_gauge(NODES_LIVE, live as f64);
        }
    }

    pub fn inc_nodes_destroyed(&self, live: usize) {
        self.nodes_destroyed.fetch_add(1, Ordering::Relaxed);
        if self.export {
            record_counter(NODES_DESTROYED, 1);
            record_gauge(NODES_LIVE, live as f64);
        }
    }

    pub fn inc_appends(&self) {
        self.appends.fetch_add(1, Ordering::Relaxed);
        if self.export {
            record_counter(APPENDS, 1);
        }
    }

    pub fn inc_pops(&self) {
        self.pops.fetch_add(1, Ordering::Relaxed);
        if self.export {
            record_counter(POPS, 1);
        }
    }

    pub fn inc_noop_pops(&self) {
        self.noop_pops.fetch_add(1, Ordering::Relaxed);
        if self.export {
            record_counter(NOOP_POPS, 1);
        }
    }

    pub fn inc_traversals(&self) {
        self.traversals.fetch_add(1, Ordering::Relaxed);
        if self.export {
            record_counter(TRAVERSALS, 1);
        }
    }

    /// Record a lock acquisition that did not succeed on the first try
    pub fn record_lock_wait(&self, waited: Duration) {
        self.lock_contentions.fetch_add(1, Ordering::Relaxed);
        if self.export {
            record_counter(LOCK_CONTENDED, 1);
            record_histogram(LOCK_WAIT_MS, waited.as_secs_f64() * 1000.0);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            nodes_created: self.nodes_created.load(Ordering::Relaxed),
            nodes_destroyed: self.nodes_destroyed.load(Ordering::Relaxed),
            appends: self.appends.load(Ordering::Relaxed),
            pops: self.pops.load(Ordering::Relaxed),
            noop_pops: self.noop_pops.load(Ordering::Relaxed),
            traversals: self.traversals.load(Ordering::Relaxed),
            lock_contentions: self.lock_contentions.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_counts() {
        let collector = MetricsCollector::with_export(false);
        collector.inc_nodes_created(1);
        collector.inc_appends();
        collector.inc_appends();
        collector.inc_pops();
        collector.inc_noop_pops();
        collector.record_lock_wait(Duration::from_millis(2));

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.nodes_created, 1);
        assert_eq!(snapshot.appends, 2);
        assert_eq!(snapshot.pops, 1);
        assert_eq!(snapshot.noop_pops, 1);
        assert_eq!(snapshot.lock_contentions, 1);
        assert_eq!(snapshot.traversals, 0);
    }

    #[test]
    fn test_exporting_collector_without_recorder() {
        let collector = MetricsCollector::new();
        collector.inc_traversals();
        collector.inc_nodes_destroyed(0);
        assert_eq!(collector.snapshot().traversals, 1);
        assert_eq!(collector.snapshot().nodes_destroyed, 1);
    }
}
