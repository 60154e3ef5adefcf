//! Metrics collection for hierarchy operations
//!
//! Metrics go to the `metrics` facade (a no-op until the embedding process
//! installs a recorder) and to an in-process `MetricsCollector` that can be
//! read back with `snapshot()`.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Instant;

mod collector;

pub use collector::MetricsCollector;

pub const NODES_CREATED: &str = "hierarchy.nodes.created";
pub const NODES_DESTROYED: &str = "hierarchy.nodes.destroyed";
pub const NODES_LIVE: &str = "hierarchy.nodes.live";
pub const APPENDS: &str = "hierarchy.append.total";
pub const POPS: &str = "hierarchy.pop.total";
pub const NOOP_POPS: &str = "hierarchy.pop.noop";
pub const TRAVERSALS: &str = "hierarchy.traversal.total";
pub const LOCK_CONTENDED: &str = "hierarchy.lock.contended";
pub const LOCK_WAIT_MS: &str = "hierarchy.lock.wait_ms";
pub const TREE_DURATION_MS: &str = "hierarchy.tree.duration_ms";

/// Initialize metrics with descriptions
pub fn init_metrics() {
    describe_counter!(NODES_CREATED, "Number of nodes created");
    describe_counter!(NODES_DESTROYED, "Number of nodes permanently destroyed");
    describe_gauge!(NODES_LIVE, "Number of live nodes in the arena");
    describe_counter!(APPENDS, "Number of successful append operations");
    describe_counter!(POPS, "Number of pop operations that detached a node");
    describe_counter!(NOOP_POPS, "Number of pop operations on already detached nodes");
    describe_counter!(TRAVERSALS, "Number of map, get and tree traversals");
    describe_counter!(LOCK_CONTENDED, "Number of lock acquisitions that had to wait");
    describe_histogram!(LOCK_WAIT_MS, "Time spent waiting for a contended lock in milliseconds");
    describe_histogram!(TREE_DURATION_MS, "Tree snapshot duration in milliseconds");
}

/// Record a counter metric
pub fn record_counter(name: &'static str, value: u64) {
    counter!(name).increment(value);
}

/// Record a gauge metric
pub fn record_gauge(name: &'static str, value: f64) {
    gauge!(name).set(value);
}

/// Record a histogram metric
pub fn record_histogram(name: &'static str, value: f64) {
    histogram!(name).record(value);
}

/// Timer recording its elapsed time into a histogram when stopped
pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self { name, start: Instant::now() }
    }

    /// Stop the timer and record the duration
    pub fn stop(self) {
        record_histogram(self.name, self.start.elapsed().as_secs_f64() * 1000.0);
    }
}

/// Point-in-time copy of the collector counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub nodes_created: u64,
    pub nodes_destroyed: u64,
    pub appends: u64,
    pub pops: u64,
    pub noop_pops: u64,
    pub traversals: u64,
    pub lock_contentions: u64,
}
