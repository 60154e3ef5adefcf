//! The `Hierarchy` container and its read-only introspection

use super::arena::{Arena, ListSlot, NodeSlot};
use super::error::{HierarchyError, HierarchyResult};
use super::locking::Locker;
use super::observer::{HierarchyObserver, TracingObserver};
use super::types::{ListId, NodeId};
use crate::config::{Config, HierarchyConfig};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Concurrent tree of circular sibling lists
///
/// All operations take `&self`; share the hierarchy between threads with an
/// `Arc`. Lifecycle operations live in `lifecycle.rs`, traversals in
/// `traversal.rs` and `tree.rs`.
pub struct Hierarchy<T> {
    pub(crate) arena: Arena<T>,
    pub(crate) config: HierarchyConfig,
    pub(crate) observer: Arc<dyn HierarchyObserver>,
    pub(crate) metrics: Arc<MetricsCollector>,
    /// Held exclusively by appends into child lists, shared by appends into
    /// root lists. Always taken before any list lock.
    pub(crate) topology: RwLock<()>,
}

/// Read handle to a live node
///
/// Holding a `NodeRef` keeps the node's name and payload alive even if the
/// node is destroyed meanwhile; link accessors then report the cleared state.
pub struct NodeRef<T> {
    slot: Arc<NodeSlot<T>>,
}

impl<T> NodeRef<T> {
    pub(crate) fn new(slot: Arc<NodeSlot<T>>) -> Self {
        NodeRef { slot }
    }

    pub fn id(&self) -> NodeId {
        self.slot.id
    }

    pub fn name(&self) -> &str {
        &self.slot.name
    }

    pub fn data(&self) -> &T {
        &self.slot.data
    }

    /// List of child groups
    pub fn sublist(&self) -> ListId {
        self.slot.sublist
    }

    /// List of child members
    pub fn users(&self) -> ListId {
        self.slot.users
    }

    pub fn is_attached(&self) -> bool {
        self.slot.links().attached
    }

    pub fn superlist(&self) -> Option<ListId> {
        self.slot.links().superlist
    }

    pub fn next(&self) -> Option<NodeId> {
        self.slot.links().next
    }

    pub fn prev(&self) -> Option<NodeId> {
        self.slot.links().prev
    }
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        NodeRef { slot: self.slot.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.slot.id)
            .field("name", &self.slot.name)
            .field("data", &self.slot.data)
            .field("links", &self.slot.links())
            .finish()
    }
}

impl<T> Hierarchy<T> {
    /// Create a hierarchy reporting to `tracing`
    pub fn new(config: HierarchyConfig) -> Self {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    pub fn with_observer(config: HierarchyConfig, observer: Arc<dyn HierarchyObserver>) -> Self {
        Hierarchy {
            arena: Arena::new(),
            config,
            observer,
            metrics: Arc::new(MetricsCollector::new()),
            topology: RwLock::new(()),
        }
    }

    /// Create a hierarchy from the full application configuration
    pub fn from_config(config: &Config) -> Self {
        Hierarchy {
            arena: Arena::new(),
            config: config.hierarchy.clone(),
            observer: Arc::new(TracingObserver),
            metrics: Arc::new(MetricsCollector::with_export(config.metrics.enabled)),
            topology: RwLock::new(()),
        }
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub(crate) fn locker(&self) -> Locker<'_> {
        Locker {
            observer: self.observer.as_ref(),
            metrics: self.metrics.as_ref(),
            warn_after: self.config.contention_warn_after,
        }
    }

    pub fn node(&self, id: NodeId) -> HierarchyResult<NodeRef<T>> {
        self.arena.node(id).map(NodeRef::new)
    }

    pub fn len(&self, list: ListId) -> HierarchyResult<usize> {
        Ok(self.arena.list(list)?.snapshot().len)
    }

    pub fn is_empty(&self, list: ListId) -> HierarchyResult<bool> {
        Ok(self.len(list)? == 0)
    }

    pub fn head(&self, list: ListId) -> HierarchyResult<Option<NodeId>> {
        Ok(self.arena.list(list)?.snapshot().head)
    }

    /// Node owning `list`, or `None` for a root list
    pub fn owner(&self, list: ListId) -> HierarchyResult<Option<NodeId>> {
        Ok(self.arena.list(list)?.owner)
    }

    /// Depth of `list`: the number of owner edges above it
    ///
    /// Root lists are level 0; the child lists of a node attached to a list of
    /// level `n` are level `n + 1`.
    pub fn level(&self, list: ListId) -> HierarchyResult<usize> {
        let slot = self.arena.list(list)?;
        self.ancestry(&slot, None)
    }

    /// Walk owner edges upwards from `slot`, failing if `forbidden` is met
    pub(crate) fn ancestry(
        &self,
        slot: &ListSlot,
        forbidden: Option<NodeId>,
    ) -> HierarchyResult<usize> {
        let mut depth = 0;
        let mut owner = slot.owner;
        let mut seen = HashSet::new();
        while let Some(owner_id) = owner {
            if Some(owner_id) == forbidden {
                return Err(HierarchyError::CycleDetected { node: owner_id, list: slot.id });
            }
            if !seen.insert(owner_id) {
                return Err(HierarchyError::RingCorrupted {
                    list: slot.id,
                    reason: format!("owner chain loops through {}", owner_id),
                });
            }
            depth += 1;
            let owner_slot = self.arena.node(owner_id)?;
            owner = match owner_slot.links().superlist {
                Some(parent) => self.arena.list(parent)?.owner,
                None => None,
            };
        }
        Ok(depth)
    }

    /// Levels of groups at and below `slot`, capped just above `max_depth`
    pub(crate) fn subtree_height(&self, slot: &NodeSlot<T>) -> HierarchyResult<usize> {
        self.subtree_height_bounded(slot, self.config.max_depth + 1)
    }

    fn subtree_height_bounded(&self, slot: &NodeSlot<T>, budget: usize) -> HierarchyResult<usize> {
        if budget <= 1 {
            return Ok(1);
        }
        let mut tallest = 0;
        if let Some(head) = self.head(slot.sublist)? {
            for child in self.ring_from(head) {
                let child = child?;
                tallest = tallest.max(self.subtree_height_bounded(&child, budget - 1)?);
            }
        }
        Ok(1 + tallest)
    }

    /// Node ids of `list` in ring order, starting at the head
    pub fn members(&self, list: ListId) -> HierarchyResult<Vec<NodeId>> {
        let Some(head) = self.head(list)? else {
            return Ok(Vec::new());
        };
        self.ring_from(head).map(|slot| slot.map(|slot| slot.id)).collect()
    }

    /// Check the ring invariants of `list`
    ///
    /// Holds the list lock for the duration of the check, so it is exact as
    /// long as no append is mid-splice; node reads wait for such splices.
    pub fn verify_list(&self, list: ListId) -> HierarchyResult<()> {
        let slot = self.arena.list(list)?;
        let state = self.locker().list(&slot);
        let corrupted = |reason: String| HierarchyError::RingCorrupted { list, reason };

        let Some(head) = state.head else {
            if state.len != 0 {
                return Err(corrupted(format!("no head but len {}", state.len)));
            }
            return Ok(());
        };
        if state.len == 0 {
            return Err(corrupted(format!("head {} but len 0", head)));
        }

        let mut forward = Vec::with_capacity(state.len);
        let mut cursor = head;
        for _ in 0..state.len {
            let links = self.arena.node(cursor)?.links();
            if !links.attached || links.superlist != Some(list) {
                return Err(corrupted(format!("{} does not point back to the list", cursor)));
            }
            forward.push(cursor);
            cursor = links.next.ok_or_else(|| corrupted(format!("{} has no next", cursor)))?;
        }
        if cursor != head {
            return Err(corrupted(format!("forward walk of {} steps ends at {}", state.len, cursor)));
        }

        let mut backward = Vec::with_capacity(state.len);
        for _ in 0..state.len {
            backward.push(cursor);
            let links = self.arena.node(cursor)?.links();
            cursor = links.prev.ok_or_else(|| corrupted(format!("{} has no prev", cursor)))?;
        }
        if cursor != head {
            return Err(corrupted(format!("backward walk of {} steps ends at {}", state.len, cursor)));
        }

        // Backward from head visits head, then the forward order reversed
        backward[1..].reverse();
        if forward != backward {
            return Err(corrupted("forward and backward walks disagree".to_string()));
        }
        let distinct: HashSet<_> = forward.iter().collect();
        if distinct.len() != forward.len() {
            return Err(corrupted("ring revisits a node before closing".to_string()));
        }
        Ok(())
    }

    /// Run `f` with the list lock held, passing the current head and length
    ///
    /// Appends and pops on this list wait until `f` returns, which makes
    /// traversals started from `head` inside `f` stable. The list lock is not
    /// reentrant: `f` must not call anything that locks the same list again
    /// (`len`, `head`, `append`, `pop`, `map_list`, `tree` on it), and must not
    /// `append` anywhere, since appends wait for the topology lock first.
    pub fn with_list_locked<R>(
        &self,
        list: ListId,
        f: impl FnOnce(Option<NodeId>, usize) -> R,
    ) -> HierarchyResult<R> {
        let slot = self.arena.list(list)?;
        let state = self.locker().list(&slot);
        Ok(f(state.head, state.len))
    }

    pub fn node_count(&self) -> usize {
        self.arena.node_count()
    }

    /// Live lists, child lists included
    pub fn list_count(&self) -> usize {
        self.arena.list_count()
    }
}
