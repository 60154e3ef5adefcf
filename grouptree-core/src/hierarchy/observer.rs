//! Observer hooks for structural events
//!
//! The hierarchy never writes log lines itself; it reports to an injected
//! observer. `TracingObserver` is the default and forwards everything to
//! `tracing`.

use super::types::{ListId, LockTarget, NodeId};
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Receiver of structural events
///
/// All methods have empty default bodies so an implementation only overrides
/// what it cares about. `lock_contended` runs while the reporting operation
/// may still hold earlier locks; every other method runs with none held.
pub trait HierarchyObserver: Send + Sync {
    fn node_created(&self, _node: NodeId, _name: &str) {}

    fn list_created(&self, _list: ListId) {}

    /// `len` is the list length right after the append
    fn appended(&self, _list: ListId, _node: NodeId, _len: usize) {}

    /// `len` is the list length right after the pop
    fn popped(&self, _list: ListId, _node: NodeId, _len: usize) {}

    fn destroyed(&self, _node: NodeId) {}

    /// One rendered line of a tree trace
    fn tree_line(&self, _line: &str) {}

    /// A lock acquisition blocked longer than the configured threshold
    fn lock_contended(&self, _target: LockTarget, _waited: Duration) {}
}

/// Observer that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl HierarchyObserver for NoopObserver {}

/// Observer forwarding events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl HierarchyObserver for TracingObserver {
    fn node_created(&self, node: NodeId, name: &str) {
        trace!(%node, name, "node created");
    }

    fn list_created(&self, list: ListId) {
        trace!(%list, "list created");
    }

    fn appended(&self, list: ListId, node: NodeId, len: usize) {
        debug!(%list, %node, len, "appended to list");
    }

    fn popped(&self, list: ListId, node: NodeId, len: usize) {
        debug!(%list, %node, len, "removed from list");
    }

    fn destroyed(&self, node: NodeId) {
        debug!(%node, "node destroyed");
    }

    fn tree_line(&self, line: &str) {
        trace!("{}", line);
    }

    fn lock_contended(&self, target: LockTarget, waited: Duration) {
        warn!(%target, waited_ms = waited.as_millis() as u64, "lock contention");
    }
}

/// Event captured by `RecordingObserver`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    NodeCreated { node: NodeId, name: String },
    ListCreated(ListId),
    Appended { list: ListId, node: NodeId, len: usize },
    Popped { list: ListId, node: NodeId, len: usize },
    Destroyed(NodeId),
    TreeLine(String),
    LockContended(LockTarget),
}

/// Observer keeping every event in memory, in arrival order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().clone()
    }

    /// Rendered tree lines only
    pub fn tree_lines(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ObservedEvent::TreeLine(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn push(&self, event: ObservedEvent) {
        self.events.lock().push(event);
    }
}

impl HierarchyObserver for RecordingObserver {
    fn node_created(&self, node: NodeId, name: &str) {
        self.push(ObservedEvent::NodeCreated { node, name: name.to_string() });
    }

    fn list_created(&self, list: ListId) {
        self.push(ObservedEvent::ListCreated(list));
    }

    fn appended(&self, list: ListId, node: NodeId, len: usize) {
        self.push(ObservedEvent::Appended { list, node, len });
    }

    fn popped(&self, list: ListId, node: NodeId, len: usize) {
        self.push(ObservedEvent::Popped { list, node, len });
    }

    fn destroyed(&self, node: NodeId) {
        self.push(ObservedEvent::Destroyed(node));
    }

    fn tree_line(&self, line: &str) {
        self.push(ObservedEvent::TreeLine(line.to_string()));
    }

    fn lock_contended(&self, target: LockTarget, _waited: Duration) {
        self.push(ObservedEvent::LockContended(target));
    }
}
